//! Amiga 12-bit colours and the RGB adjustment applied on output.

use crate::config::{MonitorConfig, Palette};

/// A colour register value: 4 bits each of red, green and blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmigaColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AmigaColor {
    #[must_use]
    pub const fn from_raw(value: u16) -> Self {
        Self {
            r: ((value >> 8) & 0xF) as u8,
            g: ((value >> 4) & 0xF) as u8,
            b: (value & 0xF) as u8,
        }
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        ((self.r as u16) << 8) | ((self.g as u16) << 4) | self.b as u16
    }

    /// Extra half-brite variant: every channel halved.
    #[must_use]
    pub const fn ehb(self) -> Self {
        Self {
            r: self.r >> 1,
            g: self.g >> 1,
            b: self.b >> 1,
        }
    }
}

/// Pack 8-bit channels into an opaque ARGB32 pixel.
#[must_use]
pub const fn argb(r: u8, g: u8, b: u8) -> u32 {
    0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Apply the monitor's brightness, contrast, saturation and palette.
#[must_use]
pub fn adjust_rgb(r: u8, g: u8, b: u8, monitor: &MonitorConfig) -> (u8, u8, u8) {
    if monitor.palette == Palette::Rgb {
        return (r, g, b);
    }

    let brightness = f64::from(monitor.brightness) - 50.0;
    let contrast = f64::from(monitor.contrast) / 100.0;
    let saturation = f64::from(monitor.saturation) / 50.0;
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));

    let mut y = 0.299 * r + 0.587 * g + 0.114 * b;
    let mut u = -0.147 * r - 0.289 * g + 0.436 * b;
    let mut v = 0.615 * r - 0.515 * g - 0.100 * b;

    u *= saturation * contrast;
    v *= saturation * contrast;
    y = y * contrast + brightness;

    if let Some((mono_u, mono_v)) = monitor.palette.chroma() {
        u = mono_u;
        v = mono_v;
    }

    let channel = |value: f64| value.clamp(0.0, 255.0) as u8;
    (
        channel(y + 1.140 * v),
        channel(y - 0.396 * u - 0.581 * v),
        channel(y + 2.029 * u),
    )
}

/// All 4096 Amiga colours converted to ARGB32 for the given monitor.
#[must_use]
pub fn color_space(monitor: &MonitorConfig) -> Vec<u32> {
    (0u16..=0xFFF)
        .map(|col| {
            let r = ((col >> 4) & 0xF0) as u8;
            let g = (col & 0xF0) as u8;
            let b = ((col << 4) & 0xF0) as u8;
            let (r, g, b) = adjust_rgb(r, g, b, monitor);
            argb(r, g, b)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip_and_half_brite() {
        let color = AmigaColor::from_raw(0xFA5);
        assert_eq!((color.r, color.g, color.b), (0xF, 0xA, 0x5));
        assert_eq!(color.raw(), 0xFA5);
        assert_eq!(color.ehb().raw(), 0x752);
    }

    #[test]
    fn rgb_palette_is_untouched() {
        let monitor = MonitorConfig {
            palette: Palette::Rgb,
            ..MonitorConfig::default()
        };
        let space = color_space(&monitor);
        assert_eq!(space.len(), 4096);
        assert_eq!(space[0xF00], 0xFFF0_0000);
        assert_eq!(space[0x0F0], 0xFF00_F000);
        assert_eq!(space[0x00F], 0xFF00_00F0);
    }

    #[test]
    fn neutral_colour_settings_preserve_grey() {
        let monitor = MonitorConfig::default();
        let (r, g, b) = adjust_rgb(0x80, 0x80, 0x80, &monitor);
        assert!(r.abs_diff(0x80) <= 1 && g.abs_diff(0x80) <= 1 && b.abs_diff(0x80) <= 1);
    }

    #[test]
    fn black_and_white_removes_chroma() {
        let monitor = MonitorConfig {
            palette: Palette::BlackWhite,
            ..MonitorConfig::default()
        };
        let (r, g, b) = adjust_rgb(0xF0, 0x00, 0x00, &monitor);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn brightness_shifts_luma() {
        let dark = MonitorConfig {
            brightness: 0,
            ..MonitorConfig::default()
        };
        let (r, _, _) = adjust_rgb(0x20, 0x20, 0x20, &dark);
        assert_eq!(r, 0);
    }
}
