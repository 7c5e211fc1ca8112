// Copyright (c) 2026 n0cturne

use crossterm::style::Color;

use crate::runtime::{ColorMode, DisplayMode};

// Brand colors. Red for dark mode (red team), blue for light.
const CYBER_RED: (u8, u8, u8) = (255, 26, 26);
const CYBER_BLUE: (u8, u8, u8) = (26, 115, 232);
const INK_DARK: (u8, u8, u8) = (13, 13, 13);
const INK_LIGHT: (u8, u8, u8) = (255, 255, 255);
const INK_PANEL: (u8, u8, u8) = (0, 0, 0);

const SHADE_STEPS: usize = 10;

/// Fixed palette for one rain instance: background tint plus a ramp from
/// the tint to the full glyph color. Heat indexes into the ramp.
#[derive(Clone, Debug)]
pub struct RainPalette {
    pub bg: Option<Color>,
    pub shades: Vec<Color>,
}

impl RainPalette {
    /// Shade for a normalized heat in [0, 1]. None in mono mode, where the
    /// terminal default foreground is used and weight alone conveys fade.
    pub fn shade(&self, heat: f32) -> Option<Color> {
        if self.shades.is_empty() {
            return None;
        }
        let last = self.shades.len() - 1;
        let idx = (heat.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.shades.get(idx.min(last)).copied()
    }
}

/// Colors for the two-part cursor visual: full-strength accent for the dot
/// and the hovered ring, faint accent for the idle ring.
#[derive(Clone, Copy, Debug)]
pub struct CursorPalette {
    pub accent: Option<Color>,
    pub faint: Option<Color>,
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cr = CUBE_LEVELS[r6 as usize];
    let cg = CUBE_LEVELS[g6 as usize];
    let cb = CUBE_LEVELS[b6 as usize];
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(r, g, b, cr, cg, cb);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = if avg < 8 {
        16
    } else if avg > 238 {
        231
    } else {
        232 + ((avg - 8) / 10)
    };
    let (gr, gg, gb) = if gray_idx == 16 {
        (0, 0, 0)
    } else if gray_idx == 231 {
        (255, 255, 255)
    } else {
        let v = 8 + 10 * (gray_idx - 232);
        (v, v, v)
    };
    let gray_dist = dist2(r, g, b, gr, gg, gb);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f32) -> (u8, u8, u8) {
    (
        lerp_u8(a.0, b.0, t),
        lerp_u8(a.1, b.1, t),
        lerp_u8(a.2, b.2, t),
    )
}

fn gradient(from: (u8, u8, u8), to: (u8, u8, u8), steps: usize) -> Vec<(u8, u8, u8)> {
    if steps == 0 {
        return Vec::new();
    }
    if steps == 1 {
        return vec![to];
    }
    (0..steps)
        .map(|i| lerp_rgb(from, to, i as f32 / (steps - 1) as f32))
        .collect()
}

fn quantize(mode: ColorMode, rgb: (u8, u8, u8)) -> Color {
    match mode {
        ColorMode::TrueColor => Color::Rgb {
            r: rgb.0,
            g: rgb.1,
            b: rgb.2,
        },
        _ => Color::AnsiValue(rgb_to_ansi256(rgb.0, rgb.1, rgb.2)),
    }
}

fn quantize_all(mode: ColorMode, list: &[(u8, u8, u8)]) -> Vec<Color> {
    match mode {
        ColorMode::Mono => Vec::new(),
        _ => list.iter().map(|&c| quantize(mode, c)).collect(),
    }
}

fn rain_palette(tint: (u8, u8, u8), glyph: (u8, u8, u8), color_mode: ColorMode) -> RainPalette {
    let bg = match color_mode {
        ColorMode::Mono => None,
        _ => Some(quantize(color_mode, tint)),
    };
    // Start the ramp off the tint so the faintest visible shade is not
    // indistinguishable from the background.
    let low = lerp_rgb(tint, glyph, 0.15);
    RainPalette {
        bg,
        shades: quantize_all(color_mode, &gradient(low, glyph, SHADE_STEPS)),
    }
}

/// Full-viewport backdrop: red on near-black in dark mode, blue on white in
/// light mode.
pub fn backdrop_palette(mode: DisplayMode, color_mode: ColorMode) -> RainPalette {
    match mode {
        DisplayMode::Dark => rain_palette(INK_DARK, CYBER_RED, color_mode),
        DisplayMode::Light => rain_palette(INK_LIGHT, CYBER_BLUE, color_mode),
    }
}

/// Section panel: red on black regardless of display mode.
pub fn panel_palette(_mode: DisplayMode, color_mode: ColorMode) -> RainPalette {
    rain_palette(INK_PANEL, CYBER_RED, color_mode)
}

/// Cursor accent follows the backdrop glyph color so the visual stays
/// legible on either background.
pub fn cursor_palette(mode: DisplayMode, color_mode: ColorMode) -> CursorPalette {
    if color_mode == ColorMode::Mono {
        return CursorPalette {
            accent: None,
            faint: None,
        };
    }
    let (tint, accent) = match mode {
        DisplayMode::Dark => (INK_DARK, CYBER_RED),
        DisplayMode::Light => (INK_LIGHT, CYBER_BLUE),
    };
    CursorPalette {
        accent: Some(quantize(color_mode, accent)),
        faint: Some(quantize(color_mode, lerp_rgb(tint, accent, 0.4))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_palettes_differ_by_display_mode() {
        let dark = backdrop_palette(DisplayMode::Dark, ColorMode::TrueColor);
        let light = backdrop_palette(DisplayMode::Light, ColorMode::TrueColor);
        assert_ne!(dark.shades.last(), light.shades.last());
        assert_eq!(
            dark.shades.last().copied(),
            Some(Color::Rgb {
                r: 255,
                g: 26,
                b: 26
            })
        );
        assert_eq!(
            light.shades.last().copied(),
            Some(Color::Rgb {
                r: 26,
                g: 115,
                b: 232
            })
        );
    }

    #[test]
    fn panel_palette_is_red_in_both_modes() {
        let dark = panel_palette(DisplayMode::Dark, ColorMode::TrueColor);
        let light = panel_palette(DisplayMode::Light, ColorMode::TrueColor);
        assert_eq!(dark.shades.last(), light.shades.last());
    }

    #[test]
    fn shade_clamps_and_picks_extremes() {
        let p = backdrop_palette(DisplayMode::Dark, ColorMode::TrueColor);
        assert_eq!(p.shade(1.5), p.shades.last().copied());
        assert_eq!(p.shade(-1.0), p.shades.first().copied());
    }

    #[test]
    fn mono_mode_has_no_colors() {
        let p = backdrop_palette(DisplayMode::Dark, ColorMode::Mono);
        assert!(p.shades.is_empty());
        assert_eq!(p.bg, None);
        assert_eq!(p.shade(1.0), None);
    }

    #[test]
    fn ansi256_quantization_hits_cube_corners() {
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
        assert_eq!(rgb_to_ansi256(255, 255, 255), 231);
    }
}
