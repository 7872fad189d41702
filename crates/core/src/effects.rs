//! Visual effects applied to timeline clips at render time.
//!
//! Effects are stored as a JSON list of `{ "type", "value" }` objects and
//! rendered by the editor canvas through a CSS `filter` string.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of effects stacked on one clip.
pub const MAX_EFFECTS_PER_CLIP: usize = 16;

/// Supported effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Brightness,
    Contrast,
    Saturation,
    Blur,
    Sepia,
}

impl EffectKind {
    /// Inclusive value range accepted for this kind.
    pub fn value_range(self) -> (f64, f64) {
        match self {
            Self::Brightness | Self::Contrast | Self::Saturation => (-100.0, 100.0),
            Self::Blur | Self::Sepia => (0.0, 100.0),
        }
    }

    /// CSS filter function for a single value.
    fn css(self, value: f64) -> String {
        match self {
            Self::Brightness => format!("brightness({}%)", 100.0 + value),
            Self::Contrast => format!("contrast({}%)", 100.0 + value),
            Self::Saturation => format!("saturate({}%)", 100.0 + value),
            Self::Blur => format!("blur({}px)", value / 10.0),
            Self::Sepia => format!("sepia({value}%)"),
        }
    }
}

/// One effect with its strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoEffect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub value: f64,
}

/// Validate an effect stack before it is stored.
pub fn validate_effects(effects: &[VideoEffect]) -> Result<(), CoreError> {
    if effects.len() > MAX_EFFECTS_PER_CLIP {
        return Err(CoreError::Validation(format!(
            "A clip can carry at most {MAX_EFFECTS_PER_CLIP} effects, got {}",
            effects.len()
        )));
    }
    for effect in effects {
        let (min, max) = effect.kind.value_range();
        if !effect.value.is_finite() || effect.value < min || effect.value > max {
            return Err(CoreError::Validation(format!(
                "{:?} value must be within {min}..={max}, got {}",
                effect.kind, effect.value
            )));
        }
    }
    Ok(())
}

/// Build the CSS filter string for an effect stack.
///
/// Returns `"none"` for an empty stack, matching what the canvas expects.
pub fn css_filter(effects: &[VideoEffect]) -> String {
    if effects.is_empty() {
        return "none".to_string();
    }
    effects
        .iter()
        .map(|e| e.kind.css(e.value))
        .collect::<Vec<_>>()
        .join(" ")
}
