// src/lib.rs
// agent-protocol - response interpretation and protocol control for agents
// that ask a model for runnable table-transformation code

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod chain;
pub mod clarify;
pub mod config;
pub mod error;
pub mod extract;
pub mod modes;
pub mod utils;

pub use clarify::{
    AlignmentResult, ClarificationTurn, ClarifierAnswer, ParseMethod, parse_sub_questions,
    validate_clarifier_alignment,
};
pub use error::{ProtocolError, Result};
pub use extract::{
    ExtractionResult, SolutionExtractor, extract_single_solution_from_raw, extract_with_report,
};
pub use modes::{InstructionVariant, Mode, ModeSpec, Stage, get_mode_spec};
