use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One quarter of a breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Hold1,
    Exhale,
    Hold2,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::Hold1, Phase::Exhale, Phase::Hold2];

    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::Hold1 => 1,
            Phase::Exhale => 2,
            Phase::Hold2 => 3,
        }
    }

    /// Next phase in the fixed cyclic order.
    pub fn next(self) -> Phase {
        match self {
            Phase::Inhale => Phase::Hold1,
            Phase::Hold1 => Phase::Exhale,
            Phase::Exhale => Phase::Hold2,
            Phase::Hold2 => Phase::Inhale,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Hold1 | Phase::Hold2 => "Hold",
            Phase::Exhale => "Exhale",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Inhale => "inhale",
            Phase::Hold1 => "hold1",
            Phase::Exhale => "exhale",
            Phase::Hold2 => "hold2",
        };
        f.write_str(s)
    }
}

/// Seconds for [inhale, hold1, exhale, hold2]. At least one is non-zero and
/// the sum fits in a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u32; 4]", into = "[u32; 4]")]
pub struct BreathPattern(pub(super) [u32; 4]);

impl BreathPattern {
    pub fn new(seconds: [u32; 4]) -> Result<Self, ValidationError> {
        if seconds.iter().all(|&s| s == 0) {
            return Err(ValidationError::EmptyPattern);
        }
        if seconds.iter().try_fold(0u32, |acc, &s| acc.checked_add(s)).is_none() {
            return Err(ValidationError::InvalidValue {
                field: "pattern".into(),
                message: "cycle length overflows".into(),
            });
        }
        Ok(Self(seconds))
    }

    pub fn seconds(&self, phase: Phase) -> u32 {
        self.0[phase.index()]
    }

    pub fn as_array(&self) -> [u32; 4] {
        self.0
    }

    /// Length of one full cycle in seconds.
    pub fn cycle_seconds(&self) -> u32 {
        self.0.iter().sum()
    }

    /// First phase with a non-zero duration.
    pub fn first_phase(&self) -> Phase {
        Phase::ALL
            .into_iter()
            .find(|&p| self.seconds(p) > 0)
            .unwrap_or(Phase::Inhale)
    }
}

impl TryFrom<[u32; 4]> for BreathPattern {
    type Error = ValidationError;

    fn try_from(value: [u32; 4]) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BreathPattern> for [u32; 4] {
    fn from(value: BreathPattern) -> Self {
        value.0
    }
}

/// When a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A fixed number of full cycles.
    Cycles(u32),
    /// A fixed number of seconds, regardless of where in the cycle it lands.
    TotalSeconds(u32),
}

impl Termination {
    /// Total seconds until completion for the given pattern, or `None` if
    /// it does not fit in a `u32`.
    pub fn total_seconds(&self, pattern: &BreathPattern) -> Option<u32> {
        match *self {
            Termination::Cycles(n) => pattern.cycle_seconds().checked_mul(n),
            Termination::TotalSeconds(t) => Some(t),
        }
    }

    pub fn validate(&self, pattern: &BreathPattern) -> Result<(), ValidationError> {
        match *self {
            Termination::Cycles(0) => Err(ValidationError::ZeroBound {
                field: "cycles".into(),
            }),
            Termination::TotalSeconds(0) => Err(ValidationError::ZeroBound {
                field: "total_seconds".into(),
            }),
            _ if self.total_seconds(pattern).is_none() => Err(ValidationError::InvalidValue {
                field: "cycles".into(),
                message: "session length overflows".into(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_order_is_cyclic() {
        let mut p = Phase::Inhale;
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(p);
            p = p.next();
        }
        assert_eq!(
            seen,
            vec![Phase::Inhale, Phase::Hold1, Phase::Exhale, Phase::Hold2, Phase::Inhale]
        );
    }

    #[test]
    fn all_zero_pattern_is_rejected() {
        assert_eq!(BreathPattern::new([0, 0, 0, 0]), Err(ValidationError::EmptyPattern));
        assert!(serde_json::from_str::<BreathPattern>("[0,0,0,0]").is_err());
    }

    #[test]
    fn first_phase_skips_leading_zeros() {
        let p = BreathPattern::new([0, 3, 0, 2]).unwrap();
        assert_eq!(p.first_phase(), Phase::Hold1);
        assert_eq!(BreathPattern::new([4, 7, 8, 0]).unwrap().first_phase(), Phase::Inhale);
    }

    #[test]
    fn termination_totals() {
        let p = BreathPattern::new([4, 7, 8, 0]).unwrap();
        assert_eq!(Termination::Cycles(4).total_seconds(&p), Some(76));
        assert_eq!(Termination::TotalSeconds(120).total_seconds(&p), Some(120));
        assert!(Termination::Cycles(0).validate(&p).is_err());
    }

    #[test]
    fn oversized_patterns_are_rejected() {
        assert!(matches!(
            BreathPattern::new([u32::MAX, 1, 0, 0]),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(BreathPattern::new([u32::MAX, 0, 0, 0]).is_ok());

        let p = BreathPattern::new([u32::MAX / 2, 0, 0, 0]).unwrap();
        assert_eq!(Termination::Cycles(3).total_seconds(&p), None);
        assert!(matches!(
            Termination::Cycles(3).validate(&p),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(Termination::Cycles(2).validate(&p).is_ok());
    }

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Hold2).unwrap(), "\"hold2\"");
        assert_eq!(Phase::Exhale.to_string(), "exhale");
    }
}
