//! Enumerations and value types shared by the reporting code.
//!
//! This module defines the tagged result of the effective-duration metric and
//! the policy switches the CLI exposes for the effort calculations.

use std::fmt;

use chrono::Duration;
use clap::ValueEnum;

use crate::task::NOT_APPLICABLE;

/// Effective duration of a task: a measured span, or not applicable when the
/// task is not done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveDuration {
    Elapsed(Duration),
    NotApplicable,
}

impl fmt::Display for EffectiveDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveDuration::Elapsed(d) => write!(f, "{}", d.num_days()),
            EffectiveDuration::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

/// How `effective_effort` treats a work entry missing its start or stop time.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum IncompleteEntryPolicy {
    /// Discard everything accumulated so far and continue from zero.
    #[default]
    Reset,
    /// Ignore the entry and keep the running total.
    Skip,
}

impl IncompleteEntryPolicy {
    /// What an incomplete entry does to the effective effort, for user messages.
    pub fn incomplete_entry_effect(&self) -> &'static str {
        match self {
            IncompleteEntryPolicy::Reset => {
                "resets the effective effort accumulated from earlier entries to zero"
            }
            IncompleteEntryPolicy::Skip => "is not counted as effort",
        }
    }
}

/// Sorting options for task lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    /// Newest first.
    Id,
    Title,
    Start,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_duration_display() {
        assert_eq!(EffectiveDuration::Elapsed(Duration::days(4)).to_string(), "4");
        assert_eq!(EffectiveDuration::NotApplicable.to_string(), "n/a");
    }

    #[test]
    fn test_incomplete_entry_effect_matches_policy() {
        assert!(IncompleteEntryPolicy::Reset.incomplete_entry_effect().contains("resets"));
        assert!(IncompleteEntryPolicy::Skip.incomplete_entry_effect().contains("not counted"));
        assert_eq!(IncompleteEntryPolicy::default(), IncompleteEntryPolicy::Reset);
    }
}
