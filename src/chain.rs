// src/chain.rs
// Ordered first-success-wins strategy chains
//
// Every layered heuristic in this crate (sub-question splitting, fence
// detection, solve-unit location) is a list of tagged steps tried left to
// right. The first step returning Some wins; later steps never run.

use std::fmt::Debug;
use tracing::{debug, trace};

/// One step of a chain: a diagnostic tag and a pure function over the input.
/// Every step of a chain sees the same input value.
pub type Step<'a, I, K, T> = (K, &'a dyn Fn(&I) -> Option<T>);

/// Run `steps` in order against `input`, returning the tag and output of the
/// first step that produced a value.
pub fn first_success<I, K, T>(input: &I, steps: &[Step<'_, I, K, T>]) -> Option<(K, T)>
where
    I: ?Sized,
    K: Copy + Debug,
{
    for (tag, step) in steps {
        match step(input) {
            Some(out) => {
                debug!(strategy = ?tag, "strategy matched");
                return Some((*tag, out));
            }
            None => trace!(strategy = ?tag, "strategy declined"),
        }
    }
    None
}
