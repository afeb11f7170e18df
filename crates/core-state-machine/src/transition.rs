//! Result of applying an input to the round state.

use derive_where::derive_where;

use chronobft_core_types::Context;

use crate::output::Output;
use crate::state::State;

/// The state after an input, and what to do about it.
#[derive_where(Clone, Debug, PartialEq, Eq)]
pub struct Transition<Ctx>
where
    Ctx: Context,
{
    /// State after the input, unchanged if the input did not apply
    pub next_state: State<Ctx>,
    /// At most one output per transition
    pub output: Option<Output<Ctx>>,
    /// Whether the input applied at all
    pub valid: bool,
}

impl<Ctx> Transition<Ctx>
where
    Ctx: Context,
{
    /// Move to `next_state`, without output so far.
    pub fn to(next_state: State<Ctx>) -> Self {
        Self {
            next_state,
            output: None,
            valid: true,
        }
    }

    /// The input does not apply, `state` is handed back as is.
    pub fn invalid(state: State<Ctx>) -> Self {
        Self {
            next_state: state,
            output: None,
            valid: false,
        }
    }

    /// Attach the output.
    pub fn with_output(mut self, output: Output<Ctx>) -> Self {
        self.output = Some(output);
        self
    }
}
