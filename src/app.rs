// Copyright (c) 2026 n0cturne

use std::time::Instant;

use crossterm::style::Color;

use crate::{
    cell::{Cell, Weight},
    cursor::CursorRenderer,
    frame::Frame,
    palette::{backdrop_palette, cursor_palette, panel_palette},
    pointer::{Hotspot, HotspotKind, PointerTracker, Rect},
    rain::{RainField, RainProfile},
    runtime::{ColorMode, DisplayMode},
};

const PANEL_MIN_W: u16 = 12;
const PANEL_MIN_H: u16 = 6;

const FOOTER_LEFT: &str = "[ security ]";
const FOOTER_RIGHT: &str = "[ ctf arena ]";
const FOOTER_GAP: u16 = 2;
const FOOTER_MARGIN: u16 = 2;

pub struct AppConfig {
    pub mode: DisplayMode,
    pub color_mode: ColorMode,
    pub fps: f64,
    pub token: String,
    pub reset_chance: f32,
    pub show_panel: bool,
    pub show_cursor: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: DisplayMode::Dark,
            color_mode: ColorMode::TrueColor,
            fps: 60.0,
            token: "XYZTENA".to_string(),
            reset_chance: 0.025,
            show_panel: true,
            show_cursor: true,
        }
    }
}

struct CursorPair {
    tracker: PointerTracker,
    renderer: CursorRenderer,
}

/// The hosting view: one full-viewport backdrop rain, an optional bordered
/// panel with its own rain, a footer row of link labels, and the optional
/// pointer-follow cursor on top. Composes back-to-front into the frame
/// whenever any layer changed this tick.
pub struct App {
    mode: DisplayMode,
    color_mode: ColorMode,
    token: String,

    backdrop: RainField,
    panel: Option<RainField>,
    cursor: Option<CursorPair>,

    width: u16,
    height: u16,
    panel_box: Option<Rect>,
    footer_fg: Option<Color>,

    paused: bool,
    force_repaint: bool,
    force_clear: bool,
}

impl App {
    pub fn new(cfg: AppConfig) -> Self {
        let mut backdrop_profile = RainProfile::backdrop();
        backdrop_profile.fps = cfg.fps;
        backdrop_profile.reset_chance = cfg.reset_chance;
        let backdrop = RainField::new(
            backdrop_profile,
            backdrop_palette(cfg.mode, cfg.color_mode),
        );

        let panel = cfg.show_panel.then(|| {
            let mut profile = RainProfile::panel(&cfg.token);
            profile.fps = cfg.fps;
            profile.reset_chance = cfg.reset_chance;
            RainField::new(profile, panel_palette(cfg.mode, cfg.color_mode))
        });

        let chrome = cursor_palette(cfg.mode, cfg.color_mode);
        let cursor = cfg.show_cursor.then(|| CursorPair {
            tracker: PointerTracker::new(),
            renderer: CursorRenderer::new(chrome, cfg.fps),
        });

        Self {
            mode: cfg.mode,
            color_mode: cfg.color_mode,
            token: cfg.token,
            backdrop,
            panel,
            cursor,
            width: 0,
            height: 0,
            panel_box: None,
            footer_fg: chrome.faint,
            paused: false,
            force_repaint: false,
            force_clear: false,
        }
    }

    /// First layout: derive every surface from the terminal size, start
    /// the clocks, and register the interactive regions.
    pub fn mount(&mut self, width: u16, height: u16, now: Instant) {
        self.width = width;
        self.height = height;
        self.panel_box = if self.panel.is_some() {
            panel_rect(width, height)
        } else {
            None
        };

        self.backdrop.mount(width, height, now);

        if let Some(panel) = &mut self.panel {
            match self.panel_box {
                Some(rect) => {
                    let (w, h) = inner_size(rect);
                    panel.mount(w, h, now);
                }
                None => panel.unmount(),
            }
        }

        if let Some(pair) = &mut self.cursor {
            pair.renderer.mount(now);
        }

        self.rebuild_hotspots();
        self.force_repaint = true;
        self.force_clear = true;
    }

    /// Terminal size changed. Surfaces re-derive their dimensions and
    /// clear; mounted columns keep their count and positions, so a rain
    /// narrower or wider than its new surface is expected until a restart.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.panel_box = if self.panel.is_some() {
            panel_rect(width, height)
        } else {
            None
        };

        self.backdrop.resize(width, height);

        if let Some(panel) = &mut self.panel {
            match self.panel_box {
                Some(rect) => {
                    let (w, h) = inner_size(rect);
                    if panel.is_mounted() {
                        panel.resize(w, h);
                    } else {
                        panel.mount(w, h, Instant::now());
                    }
                }
                None => panel.unmount(),
            }
        }

        self.rebuild_hotspots();
        self.force_repaint = true;
        self.force_clear = true;
    }

    /// Space key: re-derive the whole scene, same as a fresh mount.
    pub fn restart(&mut self, now: Instant) {
        self.mount(self.width, self.height, now);
    }

    pub fn toggle_theme(&mut self) {
        self.mode = self.mode.toggled();
        self.backdrop
            .set_palette(backdrop_palette(self.mode, self.color_mode));
        if let Some(panel) = &mut self.panel {
            panel.set_palette(panel_palette(self.mode, self.color_mode));
        }
        let chrome = cursor_palette(self.mode, self.color_mode);
        self.footer_fg = chrome.faint;
        if let Some(pair) = &mut self.cursor {
            pair.renderer.set_palette(chrome);
        }
        self.force_repaint = true;
        self.force_clear = true;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// The `c` key flips the cursor visual while the tracker keeps
    /// following the pointer underneath.
    pub fn toggle_cursor(&mut self, now: Instant) {
        if let Some(pair) = &mut self.cursor {
            if pair.renderer.is_mounted() {
                pair.renderer.unmount();
            } else {
                pair.renderer.mount(now);
            }
            self.force_repaint = true;
        }
    }

    pub fn pointer_moved(&mut self, x: u16, y: u16) {
        if let Some(pair) = &mut self.cursor {
            pair.tracker.handle_move(x, y);
        }
    }

    pub fn focus_changed(&mut self, focused: bool) {
        if let Some(pair) = &mut self.cursor {
            pair.tracker.set_visible(focused);
        }
    }

    pub fn has_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn bg(&self) -> Option<Color> {
        self.backdrop.palette().bg
    }

    /// Earliest pending clock deadline, for the host's poll timeout.
    /// Paused rain clocks are excluded so a paused app idles instead of
    /// spinning.
    pub fn next_deadline(&self) -> Option<Instant> {
        let mut next: Option<Instant> = None;
        let mut push = |d: Option<Instant>| {
            if let Some(d) = d {
                next = Some(match next {
                    Some(n) => n.min(d),
                    None => d,
                });
            }
        };

        if !self.paused {
            push(self.backdrop.deadline());
            if let Some(panel) = &self.panel {
                push(panel.deadline());
            }
        }
        if let Some(pair) = &self.cursor {
            push(pair.renderer.deadline());
        }
        next
    }

    /// Run every due clock once and recompose the scene if anything
    /// changed. Returns true when the frame holds new content.
    pub fn tick(&mut self, now: Instant, frame: &mut Frame) -> bool {
        let mut changed = self.force_repaint;

        if !self.paused {
            if self.backdrop.tick(now) {
                changed = true;
            }
            if let Some(panel) = &mut self.panel {
                if panel.tick(now) {
                    changed = true;
                }
            }
        }

        if let Some(pair) = &mut self.cursor {
            if pair.renderer.due(now) {
                let dirty = pair.tracker.take_dirty();
                if pair.renderer.tick(now, pair.tracker.state(), dirty) {
                    changed = true;
                }
            }
        }

        if changed {
            if self.force_clear {
                frame.clear_with_bg(self.bg());
                self.force_clear = false;
            }
            self.compose(frame);
            self.force_repaint = false;
        }
        changed
    }

    fn compose(&self, frame: &mut Frame) {
        self.backdrop.blit(frame, 0, 0);

        if let (Some(rect), Some(panel)) = (self.panel_box, &self.panel) {
            if panel.is_mounted() {
                panel.blit(frame, rect.x + 1, rect.y + 1);
                let fg = panel.palette().shade(1.0);
                let bg = panel.palette().bg;
                draw_box(frame, rect, fg, bg);
                self.draw_title(frame, rect, fg, bg);
            }
        }

        self.draw_footer(frame);

        if let Some(pair) = &self.cursor {
            if pair.renderer.is_mounted() {
                pair.renderer.paint(frame);
            }
        }
    }

    fn draw_title(&self, frame: &mut Frame, rect: Rect, fg: Option<Color>, bg: Option<Color>) {
        let title: Vec<char> = format!("[ {} ]", self.token).chars().collect();
        let len = title.len() as u16;
        if len + 2 > rect.width {
            return;
        }
        let start = rect.x + (rect.width - len) / 2;
        for (i, &ch) in title.iter().enumerate() {
            frame.set(
                start + i as u16,
                rect.y,
                Cell {
                    ch,
                    fg,
                    bg,
                    weight: Weight::Bold,
                },
            );
        }
    }

    fn draw_footer(&self, frame: &mut Frame) {
        if self.height < 2 {
            return;
        }
        let y = self.height - 1;
        let fg = self.footer_fg;
        let bg = self.bg();

        let mut x = FOOTER_MARGIN;
        for label in [FOOTER_LEFT, FOOTER_RIGHT] {
            for ch in label.chars() {
                if x >= self.width {
                    return;
                }
                frame.set(
                    x,
                    y,
                    Cell {
                        ch,
                        fg,
                        bg,
                        weight: Weight::Normal,
                    },
                );
                x += 1;
            }
            x += FOOTER_GAP;
        }
    }

    /// Interactive regions, rebuilt whenever the layout changes: the panel
    /// border is a button, its title strip is pointer-styled, footer
    /// labels are links.
    fn rebuild_hotspots(&mut self) {
        let Some(pair) = self.cursor.as_mut() else {
            return;
        };

        let mut hotspots = Vec::new();

        if let Some(rect) = self.panel_box {
            hotspots.push(Hotspot::new(rect, HotspotKind::Button));
            let title_len = (self.token.chars().count() + 4) as u16;
            if title_len + 2 <= rect.width {
                let start = rect.x + (rect.width - title_len) / 2;
                hotspots.push(Hotspot::new(
                    Rect::new(start, rect.y, title_len, 1),
                    HotspotKind::PointerStyled,
                ));
            }
        }

        if self.height >= 2 {
            let y = self.height - 1;
            let mut x = FOOTER_MARGIN;
            for label in [FOOTER_LEFT, FOOTER_RIGHT] {
                let len = label.chars().count() as u16;
                if x + len <= self.width {
                    hotspots.push(Hotspot::new(Rect::new(x, y, len, 1), HotspotKind::Link));
                }
                x += len + FOOTER_GAP;
            }
        }

        pair.tracker.set_hotspots(hotspots);
    }
}

fn inner_size(rect: Rect) -> (u16, u16) {
    (
        rect.width.saturating_sub(2),
        rect.height.saturating_sub(2),
    )
}

/// Centered panel rectangle, or None when the terminal is too small to
/// host it alongside the footer.
fn panel_rect(width: u16, height: u16) -> Option<Rect> {
    if width < PANEL_MIN_W + 2 || height < PANEL_MIN_H + 3 {
        return None;
    }
    let box_w = ((width as u32 * 3) / 5).max(PANEL_MIN_W as u32) as u16;
    let box_h = ((height as u32 * 2) / 5).max(PANEL_MIN_H as u32) as u16;
    let x = width / 2 - box_w / 2;
    let y = height / 2 - box_h / 2;
    Some(Rect::new(x, y, box_w, box_h))
}

fn draw_box(frame: &mut Frame, rect: Rect, fg: Option<Color>, bg: Option<Color>) {
    for y in 0..rect.height {
        let line = rect.y.saturating_add(y);
        for x in 0..rect.width {
            let is_top = y == 0;
            let is_bottom = y + 1 == rect.height;
            let is_left = x == 0;
            let is_right = x + 1 == rect.width;
            if !(is_top || is_bottom || is_left || is_right) {
                continue;
            }
            let ch = if (is_top || is_bottom) && (is_left || is_right) {
                '+'
            } else if is_top || is_bottom {
                '-'
            } else {
                '|'
            };
            frame.set(
                rect.x.saturating_add(x),
                line,
                Cell {
                    ch,
                    fg,
                    bg,
                    weight: Weight::Normal,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn make_app(show_panel: bool, show_cursor: bool) -> (App, Frame) {
        let mut app = App::new(AppConfig {
            show_panel,
            show_cursor,
            ..AppConfig::default()
        });
        app.mount(80, 24, Instant::now());
        let mut frame = Frame::new(80, 24, app.bg());
        frame.clear_dirty();
        (app, frame)
    }

    fn tick_once(app: &mut App, frame: &mut Frame) {
        let now = app.next_deadline().unwrap_or_else(Instant::now);
        assert!(app.tick(now, frame));
    }

    #[test]
    fn mounted_scene_has_panel_border_and_footer() {
        let (mut app, mut frame) = make_app(true, true);
        tick_once(&mut app, &mut frame);

        let rect = panel_rect(80, 24).unwrap();
        assert_eq!(frame.get(rect.x, rect.y).unwrap().ch, '+');
        assert_eq!(
            frame
                .get(rect.x + rect.width - 1, rect.y + rect.height - 1)
                .unwrap()
                .ch,
            '+'
        );
        assert_eq!(frame.get(rect.x + 1, rect.y).unwrap().ch, '-');
        assert_eq!(frame.get(rect.x, rect.y + 1).unwrap().ch, '|');

        let footer: String = (0..FOOTER_LEFT.len() as u16)
            .map(|i| frame.get(FOOTER_MARGIN + i, 23).unwrap().ch)
            .collect();
        assert_eq!(footer, FOOTER_LEFT);
    }

    #[test]
    fn disabled_panel_never_draws_a_border() {
        let (mut app, mut frame) = make_app(false, false);
        tick_once(&mut app, &mut frame);

        let rect = panel_rect(80, 24).unwrap();
        for y in 0..rect.height {
            for x in 0..rect.width {
                let ch = frame.get(rect.x + x, rect.y + y).unwrap().ch;
                assert!(ch != '+' && ch != '|', "panel chrome at ({x},{y}): {ch:?}");
            }
        }
    }

    #[test]
    fn theme_toggle_swaps_backdrop_palette_and_forces_repaint() {
        let (mut app, mut frame) = make_app(false, false);
        tick_once(&mut app, &mut frame);
        let dark_bg = app.bg();

        app.toggle_theme();
        assert_ne!(app.bg(), dark_bg);

        // Even with no clock due, the forced repaint recomposes.
        assert!(app.tick(Instant::now(), &mut frame));
        assert!(frame.is_dirty_all());
    }

    #[test]
    fn pause_freezes_rain_but_keeps_cursor_deadline() {
        let (mut app, _frame) = make_app(true, true);
        app.toggle_pause();
        // The only deadline left comes from the cursor clock.
        assert!(app.next_deadline().is_some());

        let (mut app, _frame) = make_app(true, false);
        app.toggle_pause();
        assert_eq!(app.next_deadline(), None);
    }

    #[test]
    fn paused_app_stops_producing_frames() {
        let (mut app, mut frame) = make_app(true, false);
        tick_once(&mut app, &mut frame);
        app.toggle_pause();

        let later = Instant::now() + Duration::from_secs(5);
        assert!(!app.tick(later, &mut frame));

        app.toggle_pause();
        assert!(app.tick(later + Duration::from_secs(1), &mut frame));
    }

    #[test]
    fn footer_labels_are_link_hotspots() {
        let (mut app, _frame) = make_app(true, true);

        app.pointer_moved(FOOTER_MARGIN + 1, 23);
        let pair = app.cursor.as_ref().unwrap();
        assert!(pair.tracker.state().hovering);

        app.pointer_moved(40, 2);
        let pair = app.cursor.as_ref().unwrap();
        assert!(!pair.tracker.state().hovering);
    }

    #[test]
    fn panel_border_is_a_button_hotspot() {
        let (mut app, _frame) = make_app(true, true);
        let rect = panel_rect(80, 24).unwrap();

        app.pointer_moved(rect.x + 2, rect.y + 2);
        let pair = app.cursor.as_ref().unwrap();
        assert!(pair.tracker.state().hovering);
    }

    #[test]
    fn disabled_panel_registers_no_button_hotspot() {
        let (mut app, _frame) = make_app(false, true);

        // Dead center of where the panel box would sit.
        app.pointer_moved(40, 12);
        let pair = app.cursor.as_ref().unwrap();
        assert!(!pair.tracker.state().hovering);

        app.resize(120, 40);
        app.pointer_moved(60, 20);
        let pair = app.cursor.as_ref().unwrap();
        assert!(!pair.tracker.state().hovering);
    }

    #[test]
    fn cursor_toggle_erases_the_visual() {
        let (mut app, mut frame) = make_app(false, true);
        app.pointer_moved(40, 12);

        // Late enough that both the backdrop and the cursor clocks fire.
        let later = Instant::now() + Duration::from_millis(100);
        assert!(app.tick(later, &mut frame));
        assert_eq!(frame.get(40, 12).unwrap().ch, '●');

        app.toggle_cursor(later);
        assert!(app.tick(later + Duration::from_millis(1), &mut frame));
        assert_ne!(frame.get(40, 12).unwrap().ch, '●');
    }

    #[test]
    fn tiny_terminal_skips_the_panel() {
        let mut app = App::new(AppConfig::default());
        app.mount(10, 6, Instant::now());
        let mut frame = Frame::new(10, 6, app.bg());
        frame.clear_dirty();

        tick_once(&mut app, &mut frame);
        for y in 0..6 {
            for x in 0..10 {
                assert_ne!(frame.get(x, y).unwrap().ch, '+');
            }
        }
    }

    #[test]
    fn resize_relayouts_without_restarting_columns() {
        let (mut app, _frame) = make_app(true, false);
        let columns_before = app.backdrop.column_count();

        app.resize(120, 40);
        assert_eq!(app.backdrop.column_count(), columns_before);
        assert_eq!(app.panel_box, panel_rect(120, 40));

        let mut frame = Frame::new(120, 40, app.bg());
        frame.clear_dirty();
        tick_once(&mut app, &mut frame);
    }
}
