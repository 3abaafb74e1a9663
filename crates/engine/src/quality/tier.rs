use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse visual quality, ordered from worst to best so `Low < Ultra`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
    #[default]
    Ultra,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCapabilities {
    pub particles: bool,
    pub glow: bool,
    pub animations: bool,
    pub effects: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown quality tier '{0}' (expected ultra, high, medium or low)")]
pub struct ParseTierError(pub String);

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [
        QualityTier::Ultra,
        QualityTier::High,
        QualityTier::Medium,
        QualityTier::Low,
    ];

    pub const fn capabilities(self) -> TierCapabilities {
        match self {
            QualityTier::Ultra => TierCapabilities {
                particles: true,
                glow: true,
                animations: true,
                effects: true,
            },
            QualityTier::High => TierCapabilities {
                particles: true,
                glow: true,
                animations: true,
                effects: false,
            },
            QualityTier::Medium => TierCapabilities {
                particles: true,
                glow: false,
                animations: true,
                effects: false,
            },
            QualityTier::Low => TierCapabilities {
                particles: false,
                glow: false,
                animations: false,
                effects: false,
            },
        }
    }

    /// One step down, or `None` at `Low`.
    pub const fn lower(self) -> Option<QualityTier> {
        match self {
            QualityTier::Ultra => Some(QualityTier::High),
            QualityTier::High => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::Low),
            QualityTier::Low => None,
        }
    }

    /// One step up, or `None` at `Ultra`.
    pub const fn higher(self) -> Option<QualityTier> {
        match self {
            QualityTier::Low => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::High),
            QualityTier::High => Some(QualityTier::Ultra),
            QualityTier::Ultra => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            QualityTier::Ultra => "ultra",
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityTier {
    type Err = ParseTierError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        QualityTier::ALL
            .into_iter()
            .find(|tier| tier.name() == normalized)
            .ok_or_else(|| ParseTierError(raw.to_string()))
    }
}
