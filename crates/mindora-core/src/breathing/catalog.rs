//! Built-in breathing exercises.
//!
//! Each exercise gets its own snapshot key so sessions never clobber each
//! other; all of them share one completion log.

use serde::{Deserialize, Serialize};

use super::pattern::{BreathPattern, Termination};
use crate::error::ValidationError;

pub const COACHING_BOX: &str = "coaching-box";
pub const BOX: &str = "box";
pub const CALM: &str = "calm";
pub const ENERGIZE: &str = "energize";
pub const DEEP: &str = "deep";
pub const WELLNESS_BREATHING: &str = "wellness-breathing";
pub const WELLNESS_MINDFULNESS: &str = "wellness-mindfulness";

/// Prefix for per-exercise live snapshot keys.
pub const STATE_KEY_PREFIX: &str = "mindora_breath_state:";

/// A runnable exercise: pattern plus termination condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub pattern: BreathPattern,
    pub termination: Termination,
}

impl Exercise {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pattern: BreathPattern,
        termination: Termination,
    ) -> Result<Self, ValidationError> {
        termination.validate(&pattern)?;
        Ok(Self {
            id: id.into(),
            name: name.into(),
            pattern,
            termination,
        })
    }

    /// `None` when the session length overflows; see `Termination::validate`.
    pub fn total_seconds(&self) -> Option<u32> {
        self.termination.total_seconds(&self.pattern)
    }

    /// Storage key for this exercise's live snapshot.
    pub fn state_key(&self) -> String {
        format!("{STATE_KEY_PREFIX}{}", self.id)
    }
}

fn builtin(id: &str, name: &str, pattern: [u32; 4], termination: Termination) -> Exercise {
    // Literal tables below are all non-empty with non-zero bounds.
    Exercise {
        id: id.into(),
        name: name.into(),
        pattern: BreathPattern(pattern),
        termination,
    }
}

/// All built-in exercises, in display order.
pub fn builtin_exercises() -> Vec<Exercise> {
    vec![
        builtin(COACHING_BOX, "Box breathing 4-4-4-4 (2 min)", [4, 4, 4, 4], Termination::TotalSeconds(120)),
        builtin(BOX, "Box breathing", [4, 4, 4, 4], Termination::Cycles(5)),
        builtin(CALM, "4-7-8 calm", [4, 7, 8, 0], Termination::Cycles(4)),
        builtin(ENERGIZE, "Energize", [2, 0, 2, 0], Termination::Cycles(10)),
        builtin(DEEP, "Deep breathing", [5, 2, 5, 2], Termination::Cycles(6)),
        // Wellness tips walk their steps once.
        builtin(WELLNESS_BREATHING, "Wellness breathing tip", [4, 4, 4, 0], Termination::Cycles(1)),
        builtin(WELLNESS_MINDFULNESS, "Mindfulness tip", [60, 120, 120, 0], Termination::Cycles(1)),
    ]
}

/// Find a built-in exercise by id.
pub fn find(id: &str) -> Option<Exercise> {
    builtin_exercises().into_iter().find(|e| e.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_valid_and_unique() {
        let all = builtin_exercises();
        for ex in &all {
            assert!(BreathPattern::new(ex.pattern.as_array()).is_ok(), "{}", ex.id);
            assert!(ex.termination.validate(&ex.pattern).is_ok(), "{}", ex.id);
        }
        let mut ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), all.len());
    }

    #[test]
    fn totals_match_original_parameters() {
        assert_eq!(find(COACHING_BOX).unwrap().total_seconds(), Some(120));
        assert_eq!(find(BOX).unwrap().total_seconds(), Some(80));
        assert_eq!(find(CALM).unwrap().total_seconds(), Some(76));
        assert_eq!(find(ENERGIZE).unwrap().total_seconds(), Some(40));
        assert_eq!(find(DEEP).unwrap().total_seconds(), Some(84));
        assert_eq!(find(WELLNESS_BREATHING).unwrap().total_seconds(), Some(12));
        assert_eq!(find(WELLNESS_MINDFULNESS).unwrap().total_seconds(), Some(300));
    }

    #[test]
    fn state_keys_are_distinct() {
        assert_eq!(find(BOX).unwrap().state_key(), "mindora_breath_state:box");
        assert_ne!(find(BOX).unwrap().state_key(), find(CALM).unwrap().state_key());
    }
}
