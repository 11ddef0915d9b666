use serde::{Deserialize, Serialize};

/// How the custom supplier's frame is combined with the live mic frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixPolicy {
    /// `clamp(mic * mic_gain + custom * custom_gain)`.
    #[default]
    Additive,
    /// Custom frame when available, otherwise the scaled mic frame.
    Replace,
    /// Custom frame when available, otherwise silence. The mic is never read.
    CustomOnly,
}

impl std::fmt::Display for MixPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Additive => "additive",
            Self::Replace => "replace",
            Self::CustomOnly => "custom_only",
        })
    }
}
