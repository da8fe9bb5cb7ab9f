//! Configuration for the video core.

use commodore_agnus_ocs::Region;
use commodore_denise_ocs::{DeniseConfig, MonitorConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub region: Region,
    pub denise: DeniseConfig,
    pub monitor: MonitorConfig,
    /// Frame buffers in the display ring (at least two).
    pub frame_buffers: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            region: Region::Pal,
            denise: DeniseConfig::default(),
            monitor: MonitorConfig::default(),
            frame_buffers: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commodore_denise_ocs::{DeniseVariant, Palette};

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{
            "region": "Ntsc",
            "denise": { "variant": "SuperDenise8373", "vblank_lines": 0 },
            "monitor": { "palette": "Amber" }
        }"#;
        let config: CoreConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.region, Region::Ntsc);
        assert_eq!(config.denise.variant, DeniseVariant::SuperDenise8373);
        assert_eq!(config.denise.vblank_lines, 0);
        assert!(config.denise.clx_plf_plf);
        assert_eq!(config.monitor.palette, Palette::Amber);
        assert_eq!(config.monitor.contrast, 100);
        assert_eq!(config.frame_buffers, 2);
    }
}
