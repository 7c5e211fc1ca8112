// Copyright (c) 2026 n0cturne

use std::f32::consts::TAU;
use std::time::Instant;

use crossterm::style::Color;

use crate::{
    cell::{Cell, Weight},
    clock::FrameClock,
    frame::Frame,
    palette::CursorPalette,
    pointer::PointerState,
};

// Ring spring tuned as stiffness 250, damping 20, mass 0.5; the closed
// form below treats it as critically damped with omega = sqrt(k/m).
const RING_OMEGA: f32 = 22.36;

const RING_RADIUS: f32 = 2.0;
const RING_SEGMENTS: usize = 32;

const SCALE_IDLE: f32 = 1.0;
const SCALE_HOVER: f32 = 1.5;
const EMPHASIS_IDLE: f32 = 0.5;
const EMPHASIS_HOVER: f32 = 1.0;

const DOT_GLYPH: char = '●';
const DOT_GLYPH_HOVER: char = '•';
const RING_GLYPH: char = '·';

/// Critically damped spring advanced in closed form, stable for any dt.
/// Snaps to the target once displacement and velocity fall under the
/// settle floor, so animations finish instead of trailing forever.
#[derive(Clone, Copy, Debug)]
struct Spring {
    value: f32,
    velocity: f32,
    target: f32,
    omega: f32,
    settle_dist: f32,
    settle_vel: f32,
}

impl Spring {
    fn new(value: f32, omega: f32, settle_dist: f32, settle_vel: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
            target: value,
            omega,
            settle_dist,
            settle_vel,
        }
    }

    fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    fn snap(&mut self) {
        self.value = self.target;
        self.velocity = 0.0;
    }

    fn settled(&self) -> bool {
        (self.value - self.target).abs() <= self.settle_dist
            && self.velocity.abs() <= self.settle_vel
    }

    /// x(t) = (x0 + (v0 + omega*x0)*t) * exp(-omega*t), x measured from
    /// the target.
    fn advance(&mut self, dt: f32) {
        if self.settled() {
            self.snap();
            return;
        }
        let exp_term = (-self.omega * dt).exp();
        let x0 = self.value - self.target;
        let v0 = self.velocity;
        let new_x = (x0 + (v0 + self.omega * x0) * dt) * exp_term;
        self.velocity = (v0 + self.omega * x0) * exp_term
            - self.omega * (x0 + (v0 + self.omega * x0) * dt) * exp_term;
        self.value = self.target + new_x;
        if self.settled() {
            self.snap();
        }
    }
}

/// Two-part cursor visual: a dot pinned to the raw pointer cell and a ring
/// that trails it on springs. Hover widens and emphasizes the ring while
/// the dot shrinks. Reads PointerState, never writes it.
pub struct CursorRenderer {
    ring_x: Spring,
    ring_y: Spring,
    ring_scale: Spring,
    emphasis: Spring,

    clock: FrameClock,
    fps: f64,
    palette: CursorPalette,
    state: PointerState,
}

impl CursorRenderer {
    pub fn new(palette: CursorPalette, fps: f64) -> Self {
        // Position springs settle in cell units; scale and emphasis move
        // in a unit range and need a much finer floor.
        let mut clock = FrameClock::start(fps, Instant::now());
        clock.cancel();
        Self {
            ring_x: Spring::new(0.0, RING_OMEGA, 0.5, 1.0),
            ring_y: Spring::new(0.0, RING_OMEGA, 0.5, 1.0),
            ring_scale: Spring::new(SCALE_IDLE, RING_OMEGA, 0.01, 0.05),
            emphasis: Spring::new(EMPHASIS_IDLE, RING_OMEGA, 0.01, 0.05),
            clock,
            fps,
            palette,
            state: PointerState::default(),
        }
    }

    pub fn mount(&mut self, now: Instant) {
        self.clock = FrameClock::start(self.fps, now);
    }

    pub fn unmount(&mut self) {
        self.clock.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.clock.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.clock.deadline()
    }

    /// The host checks this before consuming the tracker's dirty flag, so
    /// a flag raised between ticks survives until the next due frame.
    pub fn due(&self, now: Instant) -> bool {
        self.clock.due(now)
    }

    pub fn set_palette(&mut self, palette: CursorPalette) {
        self.palette = palette;
    }

    /// Run one clocked frame against the latest tracker state. Returns
    /// true when the visual changed and the scene needs recomposing.
    /// `dirty` carries the tracker's coalesced "state changed" flag.
    pub fn tick(&mut self, now: Instant, state: PointerState, dirty: bool) -> bool {
        if !self.clock.due(now) {
            return false;
        }
        self.clock.advance(now);

        if dirty {
            self.retarget(&state);
        }

        let animating = !(self.ring_x.settled()
            && self.ring_y.settled()
            && self.ring_scale.settled()
            && self.emphasis.settled());
        if animating {
            let dt = self.clock.period().as_secs_f32();
            self.ring_x.advance(dt);
            self.ring_y.advance(dt);
            self.ring_scale.advance(dt);
            self.emphasis.advance(dt);
        }

        dirty || animating
    }

    fn retarget(&mut self, state: &PointerState) {
        let appearing = state.visible && !self.state.visible;

        self.ring_x.set_target(state.x as f32);
        self.ring_y.set_target(state.y as f32);
        let (scale, emphasis) = if state.hovering {
            (SCALE_HOVER, EMPHASIS_HOVER)
        } else {
            (SCALE_IDLE, EMPHASIS_IDLE)
        };
        self.ring_scale.set_target(scale);
        self.emphasis.set_target(emphasis);

        // First appearance jumps instead of flying in from the origin.
        if appearing {
            self.ring_x.snap();
            self.ring_y.snap();
        }

        self.state = *state;
    }

    /// Compose the cursor over an already-drawn scene. An invisible
    /// pointer contributes nothing.
    pub fn paint(&self, frame: &mut Frame) {
        if !self.state.visible {
            return;
        }

        let emphasized = self.emphasis.value >= 0.75;
        let ring_fg = if emphasized {
            self.palette.accent
        } else {
            self.palette.faint
        };
        let ring_weight = if self.emphasis.value >= 0.95 {
            Weight::Bold
        } else {
            Weight::Normal
        };

        // Terminal cells are twice as tall as wide; the x radius doubles
        // so the ring reads round.
        let ry = RING_RADIUS * self.ring_scale.value;
        let rx = ry * 2.0;
        let cx = self.ring_x.value;
        let cy = self.ring_y.value;
        for k in 0..RING_SEGMENTS {
            let a = k as f32 / RING_SEGMENTS as f32 * TAU;
            let x = (cx + rx * a.cos()).round() as i32;
            let y = (cy + ry * a.sin()).round() as i32;
            overlay(frame, x, y, RING_GLYPH, ring_fg, ring_weight);
        }

        let glyph = if self.state.hovering {
            DOT_GLYPH_HOVER
        } else {
            DOT_GLYPH
        };
        overlay(
            frame,
            self.state.x as i32,
            self.state.y as i32,
            glyph,
            self.palette.accent,
            Weight::Bold,
        );
    }

    #[cfg(test)]
    fn ring(&self) -> (f32, f32, f32, f32) {
        (
            self.ring_x.value,
            self.ring_y.value,
            self.ring_scale.value,
            self.emphasis.value,
        )
    }

    #[cfg(test)]
    fn targets(&self) -> (f32, f32) {
        (self.ring_scale.target, self.emphasis.target)
    }
}

/// Keep the underlying background so the cursor floats over the rain
/// instead of punching holes in it.
fn overlay(frame: &mut Frame, x: i32, y: i32, ch: char, fg: Option<Color>, weight: Weight) {
    if x < 0 || y < 0 || x > u16::MAX as i32 || y > u16::MAX as i32 {
        return;
    }
    let (x, y) = (x as u16, y as u16);
    if let Some(under) = frame.get(x, y) {
        let bg = under.bg;
        frame.set(x, y, Cell { ch, fg, bg, weight });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::cursor_palette;
    use crate::runtime::{ColorMode, DisplayMode};
    use std::time::Duration;

    fn renderer() -> CursorRenderer {
        CursorRenderer::new(
            cursor_palette(DisplayMode::Dark, ColorMode::TrueColor),
            60.0,
        )
    }

    fn visible_at(x: u16, y: u16, hovering: bool) -> PointerState {
        PointerState {
            x,
            y,
            hovering,
            visible: true,
        }
    }

    fn drawn_cells(frame: &Frame, bg: Option<Color>) -> usize {
        let mut n = 0;
        for y in 0..frame.height {
            for x in 0..frame.width {
                let cell = frame.get(x, y).unwrap();
                if cell.ch != ' ' || cell.bg != bg {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn spring_settles_onto_its_target() {
        let mut s = Spring::new(0.0, RING_OMEGA, 0.5, 1.0);
        s.set_target(40.0);
        for _ in 0..120 {
            s.advance(1.0 / 60.0);
        }
        assert_eq!(s.value, 40.0);
        assert_eq!(s.velocity, 0.0);
    }

    #[test]
    fn spring_moves_toward_target_without_overshoot_blowup() {
        let mut s = Spring::new(0.0, RING_OMEGA, 0.01, 0.05);
        s.set_target(10.0);
        let mut last = 0.0;
        for _ in 0..60 {
            s.advance(1.0 / 60.0);
            assert!(s.value >= last - 0.01);
            assert!(s.value <= 12.0);
            last = s.value;
        }
    }

    #[test]
    fn hover_targets_strictly_exceed_idle_targets() {
        let mut r = renderer();
        let now = Instant::now();
        r.mount(now);

        let due = r.deadline().unwrap();
        r.tick(due, visible_at(10, 10, false), true);
        let (idle_scale, idle_emphasis) = r.targets();

        let due = r.deadline().unwrap();
        r.tick(due, visible_at(10, 10, true), true);
        let (hover_scale, hover_emphasis) = r.targets();

        assert!(hover_scale > idle_scale);
        assert!(hover_emphasis > idle_emphasis);
    }

    #[test]
    fn invisible_pointer_contributes_zero_cells() {
        let mut r = renderer();
        let now = Instant::now();
        r.mount(now);

        let due = r.deadline().unwrap();
        r.tick(
            due,
            PointerState {
                x: 10,
                y: 5,
                hovering: false,
                visible: false,
            },
            true,
        );

        let mut frame = Frame::new(30, 12, None);
        frame.clear_dirty();
        r.paint(&mut frame);
        assert_eq!(drawn_cells(&frame, None), 0);
    }

    #[test]
    fn visible_pointer_paints_dot_and_ring() {
        let mut r = renderer();
        let now = Instant::now();
        r.mount(now);

        let due = r.deadline().unwrap();
        assert!(r.tick(due, visible_at(15, 6, false), true));

        let mut frame = Frame::new(30, 12, None);
        frame.clear_dirty();
        r.paint(&mut frame);

        assert_eq!(frame.get(15, 6).unwrap().ch, DOT_GLYPH);
        assert!(drawn_cells(&frame, None) > 1);
    }

    #[test]
    fn first_appearance_snaps_the_ring_to_the_sample() {
        let mut r = renderer();
        let now = Instant::now();
        r.mount(now);

        let due = r.deadline().unwrap();
        r.tick(due, visible_at(20, 8, false), true);

        let (x, y, _, _) = r.ring();
        assert_eq!((x, y), (20.0, 8.0));
    }

    #[test]
    fn ring_trails_subsequent_samples() {
        let mut r = renderer();
        let now = Instant::now();
        r.mount(now);

        let due = r.deadline().unwrap();
        r.tick(due, visible_at(0, 0, false), true);

        let due = r.deadline().unwrap();
        r.tick(due, visible_at(40, 0, false), true);

        let (x, _, _, _) = r.ring();
        assert!(x > 0.0 && x < 40.0, "ring should lag the dot, got {x}");

        // Left alone, the spring finishes the journey.
        for _ in 0..240 {
            let due = r.deadline().unwrap();
            r.tick(due, visible_at(40, 0, false), false);
        }
        let (x, _, _, _) = r.ring();
        assert_eq!(x, 40.0);
    }

    #[test]
    fn unmounted_renderer_never_ticks() {
        let mut r = renderer();
        let now = Instant::now();
        r.mount(now);
        r.unmount();

        assert!(!r.is_mounted());
        assert!(!r.tick(
            now + Duration::from_secs(5),
            visible_at(1, 1, false),
            true
        ));
    }
}
