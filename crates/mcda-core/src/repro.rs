// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Reproducibility mode controlling whether stages may fan out to a worker pool.
///
/// Results are identical in both modes; `Strict` only pins execution to the
/// calling thread.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReproMode {
    Strict,
    #[default]
    Balanced,
}

impl ReproMode {
    pub fn allows_parallel(self) -> bool {
        matches!(self, Self::Balanced)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReproMode;

    #[test]
    fn repro_mode_default_is_balanced() {
        assert_eq!(ReproMode::default(), ReproMode::Balanced);
        assert!(ReproMode::Balanced.allows_parallel());
        assert!(!ReproMode::Strict.allows_parallel());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn repro_mode_uses_snake_case_on_the_wire() {
        let encoded = serde_json::to_string(&ReproMode::Strict).expect("repro mode should serialize");
        assert_eq!(encoded, "\"strict\"");
        let decoded: ReproMode =
            serde_json::from_str("\"balanced\"").expect("repro mode should deserialize");
        assert_eq!(decoded, ReproMode::Balanced);
    }
}
