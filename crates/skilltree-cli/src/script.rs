//! Action scripts: one engine operation per line.
//!
//! ```text
//! # fill the base tier, then pick a specialization
//! max Verdo
//! unlock Smite01
//! cap 20
//! reset-current
//! ```

use skilltree_core::budget::Ceiling;
use skilltree_core::engine::{SkillTreeEngine, UnlockOutcome};
use std::fmt;
use std::str::FromStr;

/// A single user operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Unlock(String),
    Refund(String),
    Max(String),
    Reset(String),
    ResetAll,
    Cap(Ceiling, u32),
    MaxCurrent,
    ResetCurrent,
    Focus(String),
    Select(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("empty action")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

/// An action that failed to parse, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {source}")]
pub struct ScriptError {
    pub line: usize,
    #[source]
    pub source: ActionError,
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let command = words.next().ok_or(ActionError::Empty)?;
        let mut arg = |name: &'static str| words.next().ok_or(ActionError::MissingArgument(name));

        let action = match command {
            "unlock" => Action::Unlock(arg("unlock")?.to_string()),
            "refund" => Action::Refund(arg("refund")?.to_string()),
            "max" => Action::Max(arg("max")?.to_string()),
            "reset" => Action::Reset(arg("reset")?.to_string()),
            "focus" => Action::Focus(arg("focus")?.to_string()),
            "select" => Action::Select(arg("select")?.to_string()),
            "cap" => Action::Cap(Ceiling::Points, parse_number(arg("cap")?)?),
            "seal-cap" => Action::Cap(Ceiling::Seals, parse_number(arg("seal-cap")?)?),
            "reset-all" => Action::ResetAll,
            "max-current" => Action::MaxCurrent,
            "reset-current" => Action::ResetCurrent,
            other => return Err(ActionError::UnknownCommand(other.to_string())),
        };

        match words.next() {
            Some(extra) => Err(ActionError::UnexpectedArgument(extra.to_string())),
            None => Ok(action),
        }
    }
}

fn parse_number(text: &str) -> Result<u32, ActionError> {
    text.parse()
        .map_err(|_| ActionError::InvalidNumber(text.to_string()))
}

/// Parse a script. Blank lines and `#` comments are skipped.
pub fn parse_script(source: &str) -> Result<Vec<Action>, ScriptError> {
    source
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let text = line.split('#').next().unwrap_or("").trim();
            (!text.is_empty()).then_some((index + 1, text))
        })
        .map(|(line, text)| {
            text.parse()
                .map_err(|source| ScriptError { line, source })
        })
        .collect()
}

impl Action {
    /// Run against `engine` and describe what happened.
    pub fn apply(&self, engine: &mut SkillTreeEngine) -> String {
        match self {
            Action::Unlock(id) => match engine.unlock(id) {
                UnlockOutcome::Unlocked => format!("unlocked {id}"),
                UnlockOutcome::NotFound => format!("no node named {id}"),
                UnlockOutcome::Blocked(blocker) => format!("cannot unlock {id}: {blocker:?}"),
            },
            Action::Refund(id) => format!("refunded {} node(s) from {id}", engine.refund(id)),
            Action::Max(tier) => format!("unlocked {} node(s) in {tier}", engine.max_tier(tier)),
            Action::Reset(tier) => format!("refunded {} node(s) in {tier}", engine.reset_tier(tier)),
            Action::ResetAll => format!("refunded {} node(s)", engine.reset_all()),
            Action::Cap(which, value) => {
                let evicted = engine.set_ceiling(*which, *value);
                format!("{which:?} ceiling set to {value}, {evicted} node(s) evicted")
            }
            Action::MaxCurrent => format!("unlocked {} node(s)", engine.max_current()),
            Action::ResetCurrent => format!("refunded {} node(s)", engine.reset_current()),
            Action::Focus(tier) => {
                if engine.focus(tier) {
                    format!("focused {tier}")
                } else {
                    format!("no tier named {tier}")
                }
            }
            Action::Select(tier) => {
                if engine.select_specialization(tier) {
                    format!("selected {tier}")
                } else {
                    format!("cannot select {tier}")
                }
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Unlock(id) => write!(f, "unlock {id}"),
            Action::Refund(id) => write!(f, "refund {id}"),
            Action::Max(tier) => write!(f, "max {tier}"),
            Action::Reset(tier) => write!(f, "reset {tier}"),
            Action::ResetAll => f.write_str("reset-all"),
            Action::Cap(Ceiling::Points, value) => write!(f, "cap {value}"),
            Action::Cap(Ceiling::Seals, value) => write!(f, "seal-cap {value}"),
            Action::MaxCurrent => f.write_str("max-current"),
            Action::ResetCurrent => f.write_str("reset-current"),
            Action::Focus(tier) => write!(f, "focus {tier}"),
            Action::Select(tier) => write!(f, "select {tier}"),
        }
    }
}
