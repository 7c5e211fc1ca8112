// Copyright (c) 2026 n0cturne

use crate::cell::{Cell, Weight};
use crate::frame::Frame;
use crate::palette::RainPalette;

// Heat below this renders as plain background; with the backdrop fade of
// 0.05 per frame a stamped glyph stays visible for about a second at 60fps.
const HEAT_FLOOR: f32 = 0.04;

const BOLD_HEAT: f32 = 0.85;
const DIM_HEAT: f32 = 0.30;

#[derive(Clone, Copy, Debug)]
struct GlyphCell {
    ch: char,
    heat: f32,
}

impl GlyphCell {
    const COLD: GlyphCell = GlyphCell { ch: ' ', heat: 0.0 };
}

/// Drawing surface owned by one rain instance. Glyphs are stamped at full
/// heat and decay multiplicatively each frame. The trail is never erased,
/// only overpainted, like a low-alpha fill over a canvas.
#[derive(Clone, Debug)]
pub struct Raster {
    width: u16,
    height: u16,
    cells: Vec<GlyphCell>,
}

impl Raster {
    pub fn new(width: u16, height: u16) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![GlyphCell::COLD; len],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Re-derive dimensions after the container changed. Content is
    /// discarded, matching a canvas resize.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.clear();
        self.cells
            .resize(width as usize * height as usize, GlyphCell::COLD);
    }

    /// The trail pass: every cell keeps its glyph but loses `alpha` of its
    /// remaining heat. Cells below the floor go cold.
    pub fn fade(&mut self, alpha: f32) {
        let keep = (1.0 - alpha).clamp(0.0, 1.0);
        for cell in &mut self.cells {
            if cell.heat <= 0.0 {
                continue;
            }
            cell.heat *= keep;
            if cell.heat < HEAT_FLOOR {
                *cell = GlyphCell::COLD;
            }
        }
    }

    /// Stamp a glyph at full heat. Coordinates outside the surface clip
    /// silently, as canvas text drawn past the edge would.
    pub fn stamp(&mut self, x: i32, y: i32, ch: char) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.cells[idx] = GlyphCell { ch, heat: 1.0 };
    }

    #[cfg(test)]
    pub fn heat_at(&self, x: u16, y: u16) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.cells[y as usize * self.width as usize + x as usize].heat
    }

    #[cfg(test)]
    pub fn glyph_at(&self, x: u16, y: u16) -> char {
        if x >= self.width || y >= self.height {
            return ' ';
        }
        self.cells[y as usize * self.width as usize + x as usize].ch
    }

    /// Compose this surface into the frame at `(ox, oy)`, mapping heat
    /// through the palette ramp. Hot cells render bold, cooling cells dim.
    pub fn blit(&self, frame: &mut Frame, ox: u16, oy: u16, palette: &RainPalette) {
        for y in 0..self.height {
            let fy = oy.saturating_add(y);
            for x in 0..self.width {
                let fx = ox.saturating_add(x);
                let cell = self.cells[y as usize * self.width as usize + x as usize];

                let out = if cell.heat <= 0.0 {
                    Cell::blank_with_bg(palette.bg)
                } else {
                    let weight = if cell.heat >= BOLD_HEAT {
                        Weight::Bold
                    } else if cell.heat < DIM_HEAT {
                        Weight::Dim
                    } else {
                        Weight::Normal
                    };
                    Cell {
                        ch: cell.ch,
                        fg: palette.shade(cell.heat),
                        bg: palette.bg,
                        weight,
                    }
                };
                frame.set(fx, fy, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::backdrop_palette;
    use crate::runtime::{ColorMode, DisplayMode};

    #[test]
    fn stamp_sets_full_heat_and_clips_outside() {
        let mut r = Raster::new(4, 4);
        r.stamp(2, 3, 'ﾊ');
        assert_eq!(r.heat_at(2, 3), 1.0);
        assert_eq!(r.glyph_at(2, 3), 'ﾊ');

        r.stamp(-1, 0, 'x');
        r.stamp(0, 99, 'x');
        r.stamp(4, 0, 'x');
        assert_eq!(r.heat_at(0, 0), 0.0);
    }

    #[test]
    fn fade_decays_multiplicatively_and_floors_to_cold() {
        let mut r = Raster::new(2, 2);
        r.stamp(0, 0, 'A');

        r.fade(0.1);
        let after_one = r.heat_at(0, 0);
        assert!((after_one - 0.9).abs() < 1e-6);

        for _ in 0..40 {
            r.fade(0.1);
        }
        assert_eq!(r.heat_at(0, 0), 0.0);
        assert_eq!(r.glyph_at(0, 0), ' ');
    }

    #[test]
    fn resize_rederives_dimensions_and_discards_content() {
        let mut r = Raster::new(3, 3);
        r.stamp(1, 1, 'Z');
        r.resize(5, 2);
        assert_eq!(r.width(), 5);
        assert_eq!(r.height(), 2);
        assert_eq!(r.heat_at(1, 1), 0.0);
    }

    #[test]
    fn blit_renders_cold_cells_as_background() {
        let palette = backdrop_palette(DisplayMode::Dark, ColorMode::TrueColor);
        let r = Raster::new(2, 1);
        let mut frame = Frame::new(2, 1, None);
        frame.clear_dirty();

        r.blit(&mut frame, 0, 0, &palette);
        let cell = frame.get(0, 0).unwrap();
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.bg, palette.bg);
    }

    #[test]
    fn blit_weights_follow_heat() {
        let palette = backdrop_palette(DisplayMode::Dark, ColorMode::TrueColor);
        let mut r = Raster::new(2, 1);
        r.stamp(0, 0, 'H');
        r.stamp(1, 0, 'T');
        // Cool the tail cell well below the dim threshold.
        for _ in 0..12 {
            r.fade(0.1);
        }
        r.stamp(0, 0, 'H');

        let mut frame = Frame::new(2, 1, None);
        frame.clear_dirty();
        r.blit(&mut frame, 0, 0, &palette);

        assert_eq!(frame.get(0, 0).unwrap().weight, crate::cell::Weight::Bold);
        assert_eq!(frame.get(1, 0).unwrap().weight, crate::cell::Weight::Dim);
    }

    #[test]
    fn blit_clips_at_frame_bounds() {
        let palette = backdrop_palette(DisplayMode::Dark, ColorMode::TrueColor);
        let mut r = Raster::new(3, 3);
        r.stamp(2, 2, 'X');

        let mut frame = Frame::new(4, 4, None);
        frame.clear_dirty();
        r.blit(&mut frame, 3, 3, &palette);
        // Only the surface origin lands inside the frame.
        assert_eq!(frame.get(3, 3).unwrap().ch, ' ');
        assert!(frame.get(5, 5).is_none());
    }
}
