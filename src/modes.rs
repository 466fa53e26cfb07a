// src/modes.rs
// Run-mode registry: which pipeline stages a mode enables and which task
// instruction variant the model sees
//
// This table is the only place mode semantics live. Callers gate profiling,
// clarification and flow execution through `ModeSpec::allows` and pick the
// instruction text through `InstructionVariant::select`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::error::{ProtocolError, Result};

/// Known run modes
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::IntoStaticStr,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Mode {
    /// Task statement only, no optional stages
    #[strum(serialize = "baseline")]
    #[serde(rename = "baseline")]
    Baseline,
    /// Input profiling before code generation
    #[strum(serialize = "profile")]
    #[serde(rename = "profile")]
    Profile,
    /// Profiling plus an interactive clarification dialog
    #[strum(serialize = "clarify")]
    #[serde(rename = "clarify")]
    Clarify,
    /// Model receives the fully disambiguated task; nothing left to ask
    #[strum(serialize = "oracle")]
    #[serde(rename = "oracle")]
    Oracle,
    /// Profiling plus multi-step flow execution
    #[strum(serialize = "flow")]
    #[serde(rename = "flow")]
    Flow,
    /// Every stage enabled
    #[strum(serialize = "e2e")]
    #[serde(rename = "e2e")]
    E2e,
}

/// Which task instruction text is fed to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InstructionVariant {
    Task,
    TaskFullyDisambiguated,
}

/// Optional pipeline stages a mode may enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Profile,
    Clarify,
    Flow,
}

/// Immutable description of one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeSpec {
    pub name: &'static str,
    pub instruction_variant: InstructionVariant,
    pub allow_profile: bool,
    pub allow_clarify: bool,
    pub allow_flow: bool,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// The stage table. Exhaustive, so adding a mode forces a row here.
    pub const fn spec(self) -> ModeSpec {
        use InstructionVariant::{Task, TaskFullyDisambiguated};
        let (name, instruction_variant, allow_profile, allow_clarify, allow_flow) = match self {
            Mode::Baseline => ("baseline", Task, false, false, false),
            Mode::Profile => ("profile", Task, true, false, false),
            Mode::Clarify => ("clarify", Task, true, true, false),
            Mode::Oracle => ("oracle", TaskFullyDisambiguated, true, false, false),
            Mode::Flow => ("flow", Task, true, false, true),
            Mode::E2e => ("e2e", Task, true, true, true),
        };
        ModeSpec {
            name,
            instruction_variant,
            allow_profile,
            allow_clarify,
            allow_flow,
        }
    }

    /// Valid mode names, sorted
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Mode::iter().map(|m| m.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ModeSpec {
    pub fn allows(&self, stage: Stage) -> bool {
        match stage {
            Stage::Profile => self.allow_profile,
            Stage::Clarify => self.allow_clarify,
            Stage::Flow => self.allow_flow,
        }
    }

    /// Pick the instruction text this mode feeds to the model
    pub fn instruction<'a>(&self, task: &'a str, disambiguated: &'a str) -> &'a str {
        self.instruction_variant.select(task, disambiguated)
    }
}

impl InstructionVariant {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn select<'a>(&self, task: &'a str, disambiguated: &'a str) -> &'a str {
        match self {
            InstructionVariant::Task => task,
            InstructionVariant::TaskFullyDisambiguated => disambiguated,
        }
    }
}

/// Parse a mode name, case-insensitive after trimming
pub fn parse_mode(name: &str) -> Result<Mode> {
    Mode::from_str(name.trim()).map_err(|_| ProtocolError::UnsupportedMode {
        name: name.to_string(),
        valid: Mode::names().into_iter().map(String::from).collect(),
    })
}

/// Look up the spec for a mode name. Unknown names are an error, never a default.
pub fn get_mode_spec(name: &str) -> Result<ModeSpec> {
    let mode = parse_mode(name)?;
    let spec = mode.spec();
    debug!(
        mode = spec.name,
        instruction = spec.instruction_variant.as_str(),
        profile = spec.allow_profile,
        clarify = spec.allow_clarify,
        flow = spec.allow_flow,
        "Resolved mode"
    );
    Ok(spec)
}

/// Every mode spec, sorted by name
pub fn all_mode_specs() -> Vec<ModeSpec> {
    let mut specs: Vec<ModeSpec> = Mode::iter().map(Mode::spec).collect();
    specs.sort_unstable_by_key(|s| s.name);
    specs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let upper = get_mode_spec("E2E").unwrap();
        let lower = get_mode_spec("e2e").unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.name, "e2e");
    }

    #[test]
    fn test_lookup_trims_whitespace() {
        assert_eq!(get_mode_spec("  Clarify \n").unwrap(), Mode::Clarify.spec());
    }

    #[test]
    fn test_unknown_mode_lists_sorted_names() {
        let err = get_mode_spec("bogus").unwrap_err();
        match &err {
            ProtocolError::UnsupportedMode { name, valid } => {
                assert_eq!(name, "bogus");
                let mut sorted = valid.clone();
                sorted.sort();
                assert_eq!(valid, &sorted);
                assert_eq!(valid.len(), 6);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("baseline, clarify, e2e, flow, oracle, profile"));
    }

    #[test]
    fn test_empty_name_is_unsupported() {
        assert!(matches!(
            get_mode_spec("   "),
            Err(ProtocolError::UnsupportedMode { .. })
        ));
    }

    #[test]
    fn test_spec_names_round_trip() {
        for mode in Mode::iter() {
            assert_eq!(mode.spec().name, mode.as_str());
            assert_eq!(parse_mode(mode.as_str()).unwrap(), mode);
        }
    }

    #[test]
    fn test_stage_gating() {
        let baseline = Mode::Baseline.spec();
        assert!(!baseline.allows(Stage::Profile));
        assert!(!baseline.allows(Stage::Clarify));
        assert!(!baseline.allows(Stage::Flow));

        let e2e = Mode::E2e.spec();
        assert!(e2e.allows(Stage::Profile));
        assert!(e2e.allows(Stage::Clarify));
        assert!(e2e.allows(Stage::Flow));

        assert!(Mode::Clarify.spec().allows(Stage::Clarify));
        assert!(!Mode::Flow.spec().allows(Stage::Clarify));
        assert!(Mode::Flow.spec().allows(Stage::Flow));
    }

    #[test]
    fn test_oracle_uses_disambiguated_instructions_without_clarify() {
        let oracle = Mode::Oracle.spec();
        assert_eq!(
            oracle.instruction_variant,
            InstructionVariant::TaskFullyDisambiguated
        );
        assert!(!oracle.allow_clarify);
        assert_eq!(oracle.instruction("task", "full"), "full");
        assert_eq!(Mode::Baseline.spec().instruction("task", "full"), "task");
    }

    #[test]
    fn test_all_mode_specs_sorted() {
        let names: Vec<_> = all_mode_specs().iter().map(|s| s.name).collect();
        assert_eq!(names, Mode::names());
    }

    #[test]
    fn test_spec_serializes_snake_case() {
        let json = serde_json::to_value(Mode::Oracle.spec()).unwrap();
        assert_eq!(json["name"], "oracle");
        assert_eq!(json["instruction_variant"], "task_fully_disambiguated");
    }
}
