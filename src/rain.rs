// Copyright (c) 2026 n0cturne

use std::time::Instant;

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    SeedableRng,
};

use crate::{
    alphabet::Alphabet, clock::FrameClock, frame::Frame, palette::RainPalette, raster::Raster,
};

/// How column positions are seeded when a field mounts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnSeed {
    /// Every column starts together, one row below the top edge.
    Synced,
    /// Columns scatter above the top edge, up to `span` rows out, so the
    /// first drops arrive staggered.
    Staggered(f32),
}

/// Tuning for one rain instance. The full-screen backdrop and the panel
/// field run the same simulation with different constants.
#[derive(Clone, Debug)]
pub struct RainProfile {
    pub alphabet: Alphabet,
    pub seed: ColumnSeed,
    pub pitch: u16,
    pub fade_alpha: f32,
    pub reset_chance: f32,
    pub fps: f64,
    pub rng_seed: u64,
}

impl RainProfile {
    pub fn backdrop() -> Self {
        let alphabet = Alphabet::matrix();
        let pitch = alphabet.pitch();
        Self {
            alphabet,
            seed: ColumnSeed::Synced,
            pitch,
            fade_alpha: 0.05,
            reset_chance: 0.025,
            fps: 60.0,
            rng_seed: 0xC0DE_C0DE,
        }
    }

    pub fn panel(token: &str) -> Self {
        let alphabet = Alphabet::token(token);
        let pitch = alphabet.pitch();
        Self {
            alphabet,
            seed: ColumnSeed::Staggered(50.0),
            pitch,
            fade_alpha: 0.10,
            reset_chance: 0.025,
            fps: 60.0,
            rng_seed: 0x5EED_5EED,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct FallColumn {
    position: f32,
}

/// One independent rain simulation drawing onto its own surface.
///
/// Columns hold a fractional row position. Each step stamps a fresh glyph
/// at the column's current row, then either advances the column or, once
/// it has fallen past the bottom edge, resets it to the top when a low
/// probability roll succeeds. Missed rolls keep the column falling, which
/// staggers the resets without any per-column state.
pub struct RainField {
    raster: Raster,
    columns: Vec<FallColumn>,
    alphabet: Alphabet,
    palette: RainPalette,
    clock: FrameClock,

    seed: ColumnSeed,
    pitch: u16,
    fade_alpha: f32,
    reset_chance: f32,
    fps: f64,

    mt: StdRng,
    rand_chance: Uniform<f32>,
    rand_glyph: Uniform<usize>,
}

impl RainField {
    pub fn new(profile: RainProfile, palette: RainPalette) -> Self {
        let mt = StdRng::seed_from_u64(profile.rng_seed);
        let rand_glyph =
            Uniform::new_inclusive(0, profile.alphabet.glyphs().len().saturating_sub(1))
                .expect("valid range");

        // Until mount the clock stays cancelled, so ticks never fire.
        let mut clock = FrameClock::start(profile.fps, Instant::now());
        clock.cancel();

        Self {
            raster: Raster::new(0, 0),
            columns: Vec::new(),
            alphabet: profile.alphabet,
            palette,
            clock,
            seed: profile.seed,
            pitch: profile.pitch.max(1),
            fade_alpha: profile.fade_alpha,
            reset_chance: profile.reset_chance,
            fps: profile.fps,
            mt,
            rand_chance: Uniform::new(0.0, 1.0).expect("valid range"),
            rand_glyph,
        }
    }

    /// Derive the surface and the column set from the container size and
    /// start this instance's clock. Safe to call again after `unmount`.
    pub fn mount(&mut self, width: u16, height: u16, now: Instant) {
        self.raster.resize(width, height);

        let count = (self.raster.width() / self.pitch) as usize;
        self.columns.clear();
        self.columns
            .resize(count, FallColumn { position: 1.0 });

        if let ColumnSeed::Staggered(span) = self.seed {
            let dist = Uniform::new(-span.max(1.0), 0.0).expect("valid range");
            for col in &mut self.columns {
                col.position = dist.sample(&mut self.mt);
            }
        }

        self.clock = FrameClock::start(self.fps, now);
    }

    /// The container changed size: the surface re-derives its dimensions
    /// and clears, but the column set is left alone. Columns beyond the
    /// new width stamp into the void until the next mount.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.raster.resize(width, height);
    }

    /// Stop this instance's clock. Ticks never fire again until a new
    /// `mount` hands out a fresh clock.
    pub fn unmount(&mut self) {
        self.clock.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.clock.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.clock.deadline()
    }

    pub fn set_palette(&mut self, palette: RainPalette) {
        self.palette = palette;
    }

    pub fn palette(&self) -> &RainPalette {
        &self.palette
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Run the simulation forward if this instance's clock is due.
    /// Returns true when a step ran and the surface changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.clock.due(now) {
            return false;
        }
        self.clock.advance(now);
        self.step();
        true
    }

    /// One simulation frame: cool the whole surface, then stamp and move
    /// every column.
    pub fn step(&mut self) {
        self.raster.fade(self.fade_alpha);

        let height = self.raster.height() as f32;
        let pitch = self.pitch as f32;

        for i in 0..self.column_count() {
            let idx = self.rand_glyph.sample(&mut self.mt);
            let glyph = self.alphabet.glyphs().get(idx).copied().unwrap_or('0');

            let position = self.columns[i].position;
            let x = i as i32 * self.pitch as i32;
            let y = (position * pitch).floor() as i32;
            self.raster.stamp(x, y, glyph);

            let past_bottom = position * pitch > height;
            if past_bottom && self.rand_chance.sample(&mut self.mt) < self.reset_chance {
                self.columns[i].position = 0.0;
            } else {
                self.columns[i].position += 1.0;
            }
        }
    }

    pub fn blit(&self, frame: &mut Frame, ox: u16, oy: u16) {
        self.raster.blit(frame, ox, oy, &self.palette);
    }

    #[cfg(test)]
    fn positions(&self) -> Vec<f32> {
        self.columns.iter().map(|c| c.position).collect()
    }

    #[cfg(test)]
    fn surface(&self) -> &Raster {
        &self.raster
    }
}
