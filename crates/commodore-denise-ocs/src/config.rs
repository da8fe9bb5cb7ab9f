//! Chip and monitor configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Denise chip revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeniseVariant {
    /// Original chipset Denise.
    #[default]
    Denise8362,
    /// ECS Super Denise: SHRES, BPLCON3 and DIWHIGH.
    SuperDenise8373,
}

impl DeniseVariant {
    #[must_use]
    pub const fn is_ecs(self) -> bool {
        matches!(self, Self::SuperDenise8373)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeniseConfig {
    pub variant: DeniseVariant,
    /// Bitplanes masked out before translation (bit n = plane n+1).
    pub hidden_bitplanes: u8,
    /// Sprites whose data writes are zeroed (bit n = sprite n).
    pub hidden_sprites: u8,
    /// Layers blended towards a checkerboard after colorization.
    /// Bits 0-7 select sprites, 0x100 playfield 1, 0x200 playfield 2.
    pub hidden_layers: u16,
    /// Blend strength for hidden layers, 0 (opaque) to 255 (background).
    pub hidden_layer_alpha: u8,
    pub clx_spr_spr: bool,
    pub clx_spr_plf: bool,
    pub clx_plf_plf: bool,
    /// Lines at the top of the frame that are never rendered.
    pub vblank_lines: u16,
}

impl Default for DeniseConfig {
    fn default() -> Self {
        Self {
            variant: DeniseVariant::Denise8362,
            hidden_bitplanes: 0,
            hidden_sprites: 0,
            hidden_layers: 0,
            hidden_layer_alpha: 128,
            clx_spr_spr: true,
            clx_spr_plf: true,
            clx_plf_plf: true,
            vblank_lines: 26,
        }
    }
}

/// Monitor colour model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// Raw register colours, no adjustment at all.
    Rgb,
    #[default]
    Color,
    BlackWhite,
    PaperWhite,
    Green,
    Amber,
    Sepia,
}

impl Palette {
    /// Fixed chroma (U, V) the monochrome palettes force onto every colour.
    #[must_use]
    pub const fn chroma(self) -> Option<(f64, f64)> {
        match self {
            Self::Rgb | Self::Color => None,
            Self::BlackWhite => Some((0.0, 0.0)),
            Self::PaperWhite => Some((-8.0, 5.0)),
            Self::Green => Some((-99.0, -64.0)),
            Self::Amber => Some((-104.0, 50.0)),
            Self::Sepia => Some((-31.0, 26.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub palette: Palette,
    pub brightness: u8,
    pub contrast: u8,
    pub saturation: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            palette: Palette::Color,
            brightness: 50,
            contrast: 100,
            saturation: 50,
        }
    }
}

impl MonitorConfig {
    /// Reject knob settings outside 0..=100.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutOfRange`] naming the first bad knob.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
        ] {
            if value > 100 {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_neutral() {
        let monitor = MonitorConfig::default();
        assert_eq!(monitor.validate(), Ok(()));
        assert_eq!(monitor.brightness, 50);
        assert_eq!(monitor.contrast, 100);
    }

    #[test]
    fn out_of_range_knob_is_rejected() {
        let monitor = MonitorConfig {
            saturation: 101,
            ..MonitorConfig::default()
        };
        assert_eq!(
            monitor.validate(),
            Err(ConfigError::OutOfRange {
                name: "saturation",
                value: 101
            })
        );
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: DeniseConfig =
            serde_json::from_str(r#"{ "variant": "SuperDenise8373", "clx_plf_plf": false }"#)
                .expect("valid config");
        assert!(config.variant.is_ecs());
        assert!(!config.clx_plf_plf);
        assert!(config.clx_spr_spr);
        assert_eq!(config.vblank_lines, 26);
    }
}
