use serde::{Deserialize, Serialize};

use super::pattern::{BreathPattern, Phase};

/// Minimal persisted state needed to resume an interrupted session.
///
/// Stored as JSON: `{"phase":"exhale","phaseSecondsLeft":2,"progressLeft":6}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub phase_seconds_left: u32,
    pub progress_left: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles_completed: Option<u32>,
}

impl SessionSnapshot {
    /// Parse a stored payload, returning `None` if it is malformed or doesn't
    /// fit the session it is being restored into.
    pub fn parse(raw: &str, pattern: &BreathPattern, total_seconds: u32) -> Option<Self> {
        let snapshot: SessionSnapshot = serde_json::from_str(raw).ok()?;
        snapshot.fits(pattern, total_seconds).then_some(snapshot)
    }

    /// A snapshot fits when it points inside a non-empty phase and has
    /// progress left within the session bound.
    pub fn fits(&self, pattern: &BreathPattern, total_seconds: u32) -> bool {
        let phase_len = pattern.seconds(self.phase);
        (1..=phase_len).contains(&self.phase_seconds_left)
            && (1..=total_seconds).contains(&self.progress_left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_pattern() -> BreathPattern {
        BreathPattern::new([4, 4, 4, 4]).unwrap()
    }

    #[test]
    fn parses_wire_format() {
        let raw = r#"{"phase":"exhale","phaseSecondsLeft":2,"progressLeft":6}"#;
        let snap = SessionSnapshot::parse(raw, &box_pattern(), 16).unwrap();
        assert_eq!(snap.phase, Phase::Exhale);
        assert_eq!(snap.phase_seconds_left, 2);
        assert_eq!(snap.progress_left, 6);
        assert_eq!(snap.cycles_completed, None);
    }

    #[test]
    fn malformed_payload_is_absent() {
        assert!(SessionSnapshot::parse("{not json", &box_pattern(), 16).is_none());
        assert!(SessionSnapshot::parse(r#"{"phase":"sideways"}"#, &box_pattern(), 16).is_none());
    }

    #[test]
    fn out_of_range_values_do_not_fit() {
        let p = box_pattern();
        let too_long = r#"{"phase":"inhale","phaseSecondsLeft":9,"progressLeft":6}"#;
        let zero_phase = r#"{"phase":"inhale","phaseSecondsLeft":0,"progressLeft":6}"#;
        let over_total = r#"{"phase":"inhale","phaseSecondsLeft":2,"progressLeft":17}"#;
        let finished = r#"{"phase":"inhale","phaseSecondsLeft":2,"progressLeft":0}"#;
        for raw in [too_long, zero_phase, over_total, finished] {
            assert!(SessionSnapshot::parse(raw, &p, 16).is_none(), "{raw}");
        }
    }

    #[test]
    fn zero_length_phase_never_fits() {
        let p = BreathPattern::new([4, 0, 4, 0]).unwrap();
        let raw = r#"{"phase":"hold1","phaseSecondsLeft":1,"progressLeft":4}"#;
        assert!(SessionSnapshot::parse(raw, &p, 8).is_none());
    }

    #[test]
    fn serializes_camel_case_without_missing_cycles() {
        let snap = SessionSnapshot {
            phase: Phase::Hold1,
            phase_seconds_left: 3,
            progress_left: 10,
            cycles_completed: None,
        };
        assert_eq!(
            serde_json::to_string(&snap).unwrap(),
            r#"{"phase":"hold1","phaseSecondsLeft":3,"progressLeft":10}"#
        );
    }
}
