use std::fmt;

use serde::{Deserialize, Serialize};

use super::tier::{QualityTier, TierCapabilities};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    ParticlesEnabled,
    ParticleCountMultiplier,
    GlowEffects,
    ReduceAnimations,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::ParticlesEnabled,
        SettingKey::ParticleCountMultiplier,
        SettingKey::GlowEffects,
        SettingKey::ReduceAnimations,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SettingKey::ParticlesEnabled => "particles_enabled",
            SettingKey::ParticleCountMultiplier => "particle_count_multiplier",
            SettingKey::GlowEffects => "glow_effects",
            SettingKey::ReduceAnimations => "reduce_animations",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub particles_enabled: bool,
    pub particle_count_multiplier: f32,
    pub glow_effects: bool,
    pub reduce_animations: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            particles_enabled: true,
            particle_count_multiplier: 1.0,
            glow_effects: true,
            reduce_animations: false,
        }
    }
}

impl RenderSettings {
    pub fn new(
        particles_enabled: bool,
        particle_count_multiplier: f32,
        glow_effects: bool,
        reduce_animations: bool,
    ) -> Self {
        Self {
            particles_enabled,
            particle_count_multiplier: sanitize_multiplier(particle_count_multiplier),
            glow_effects,
            reduce_animations,
        }
    }

    pub fn sanitized(self) -> Self {
        Self::new(
            self.particles_enabled,
            self.particle_count_multiplier,
            self.glow_effects,
            self.reduce_animations,
        )
    }

    /// Keys whose values differ between `self` and `other`.
    pub fn changed_keys(&self, other: &RenderSettings) -> Vec<SettingKey> {
        SettingKey::ALL
            .into_iter()
            .filter(|key| match key {
                SettingKey::ParticlesEnabled => self.particles_enabled != other.particles_enabled,
                SettingKey::ParticleCountMultiplier => {
                    self.particle_count_multiplier != other.particle_count_multiplier
                }
                SettingKey::GlowEffects => self.glow_effects != other.glow_effects,
                SettingKey::ReduceAnimations => self.reduce_animations != other.reduce_animations,
            })
            .collect()
    }
}

fn sanitize_multiplier(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Partial settings written over a [`RenderSettings`] copy; absent keys pass through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SettingsOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particles_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_count_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glow_effects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduce_animations: Option<bool>,
}

impl SettingsOverlay {
    pub fn is_empty(&self) -> bool {
        self.keys().next().is_none()
    }

    pub fn keys(&self) -> impl Iterator<Item = SettingKey> + '_ {
        SettingKey::ALL.into_iter().filter(move |key| match key {
            SettingKey::ParticlesEnabled => self.particles_enabled.is_some(),
            SettingKey::ParticleCountMultiplier => self.particle_count_multiplier.is_some(),
            SettingKey::GlowEffects => self.glow_effects.is_some(),
            SettingKey::ReduceAnimations => self.reduce_animations.is_some(),
        })
    }

    pub fn apply(&self, current: &RenderSettings) -> RenderSettings {
        let mut next = *current;
        if let Some(value) = self.particles_enabled {
            next.particles_enabled = value;
        }
        if let Some(value) = self.particle_count_multiplier {
            next.particle_count_multiplier = sanitize_multiplier(value);
        }
        if let Some(value) = self.glow_effects {
            next.glow_effects = value;
        }
        if let Some(value) = self.reduce_animations {
            next.reduce_animations = value;
        }
        next
    }
}

/// Fine-grained degradation step, 0 (none) through 5 (maximum).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct OptimizationLevel(u8);

impl OptimizationLevel {
    pub const NONE: OptimizationLevel = OptimizationLevel(0);
    pub const MAX: OptimizationLevel = OptimizationLevel(5);

    /// Values above [`OptimizationLevel::MAX`] are clamped.
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX.0))
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn escalated(self) -> Option<Self> {
        (self < Self::MAX).then(|| Self(self.0 + 1))
    }

    pub fn recovered(self) -> Option<Self> {
        (self > Self::NONE).then(|| Self(self.0 - 1))
    }

    pub fn overlay(self) -> SettingsOverlay {
        overlay_for_level(self.0)
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Level table lookup. Level 0 and anything past the table yield an empty overlay.
pub fn overlay_for_level(level: u8) -> SettingsOverlay {
    let (particles_enabled, particle_count_multiplier, glow_effects, reduce_animations) =
        match level {
            1 => (true, 0.8, true, None),
            2 => (true, 0.6, true, None),
            3 => (true, 0.4, false, None),
            4 => (true, 0.2, false, None),
            5 => (false, 0.0, false, Some(true)),
            _ => return SettingsOverlay::default(),
        };
    SettingsOverlay {
        particles_enabled: Some(particles_enabled),
        particle_count_multiplier: Some(particle_count_multiplier),
        glow_effects: Some(glow_effects),
        reduce_animations,
    }
}

/// What the render and gameplay layers must honor for the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderQuality {
    pub tier: QualityTier,
    pub capabilities: TierCapabilities,
    pub settings: RenderSettings,
}

impl Default for RenderQuality {
    fn default() -> Self {
        Self::new(QualityTier::default(), RenderSettings::default())
    }
}

impl RenderQuality {
    pub fn new(tier: QualityTier, settings: RenderSettings) -> Self {
        Self {
            tier,
            capabilities: tier.capabilities(),
            settings,
        }
    }

    pub fn draw_particles(&self) -> bool {
        self.settings.particles_enabled && self.capabilities.particles
    }

    pub fn draw_glow(&self) -> bool {
        self.settings.glow_effects && self.capabilities.glow
    }

    pub fn animate(&self) -> bool {
        self.capabilities.animations && !self.settings.reduce_animations
    }

    pub fn effects(&self) -> bool {
        self.capabilities.effects
    }

    pub fn particle_budget(&self, base_count: u32) -> u32 {
        if !self.draw_particles() {
            return 0;
        }
        (base_count as f32 * self.settings.particle_count_multiplier).round() as u32
    }
}
