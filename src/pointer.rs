// Copyright (c) 2026 n0cturne

use crossterm::tty::IsTty;

/// Axis-aligned cell rectangle, end-exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: u16, py: u16) -> bool {
        px >= self.x
            && py >= self.y
            && px < self.x.saturating_add(self.width)
            && py < self.y.saturating_add(self.height)
    }
}

/// What kind of interactive region a hotspot stands for. Hover treats all
/// kinds alike; the kind is kept for labeling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotspotKind {
    Link,
    Button,
    PointerStyled,
}

#[derive(Clone, Copy, Debug)]
pub struct Hotspot {
    pub rect: Rect,
    #[allow(dead_code)]
    pub kind: HotspotKind,
}

impl Hotspot {
    pub fn new(rect: Rect, kind: HotspotKind) -> Self {
        Self { rect, kind }
    }
}

/// Latest pointer sample plus derived flags. Plain data, copied out by the
/// cursor renderer every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerState {
    pub x: u16,
    pub y: u16,
    pub hovering: bool,
    pub visible: bool,
}

/// Consumes pointer and focus events and keeps the single source of truth
/// for pointer state. Events only mutate state here; nothing is painted
/// until the cursor's clock next fires, so bursts of samples coalesce.
pub struct PointerTracker {
    state: PointerState,
    hotspots: Vec<Hotspot>,
    dirty: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self {
            state: PointerState::default(),
            hotspots: Vec::new(),
            dirty: false,
        }
    }

    /// Replace the interactive-region registry and re-classify the current
    /// sample against it.
    pub fn set_hotspots(&mut self, hotspots: Vec<Hotspot>) {
        self.hotspots = hotspots;
        let hovering = self.classify(self.state.x, self.state.y);
        if hovering != self.state.hovering {
            self.state.hovering = hovering;
            self.dirty = true;
        }
    }

    /// One movement sample. The first sample also reveals the cursor.
    pub fn handle_move(&mut self, x: u16, y: u16) {
        let hovering = self.classify(x, y);
        let next = PointerState {
            x,
            y,
            hovering,
            visible: true,
        };
        if next != self.state {
            self.state = next;
            self.dirty = true;
        }
    }

    /// Focus leaving or entering the terminal hides or reveals the cursor.
    pub fn set_visible(&mut self, on: bool) {
        if self.state.visible != on {
            self.state.visible = on;
            self.dirty = true;
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    /// True once since the last take; the cursor renderer consumes this at
    /// tick time to decide whether a repaint is owed.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn classify(&self, x: u16, y: u16) -> bool {
        self.hotspots.iter().any(|h| h.rect.contains(x, y))
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot capability check run before the tracker mounts. A terminal
/// that is not a tty, or advertises itself as dumb, cannot deliver pointer
/// events; the pair is never created and the check is never repeated.
pub fn coarse_pointer() -> bool {
    if !std::io::stdout().is_tty() {
        return true;
    }
    matches!(
        std::env::var("TERM").ok().as_deref(),
        Some("dumb") | Some("") | None
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button_at(x: u16, y: u16, w: u16, h: u16) -> Hotspot {
        Hotspot::new(Rect::new(x, y, w, h), HotspotKind::Button)
    }

    #[test]
    fn rect_contains_is_end_exclusive() {
        let r = Rect::new(10, 10, 5, 3);
        assert!(r.contains(10, 10));
        assert!(r.contains(14, 12));
        assert!(!r.contains(15, 10));
        assert!(!r.contains(10, 13));
        assert!(!r.contains(9, 10));
    }

    #[test]
    fn first_sample_reveals_the_cursor() {
        let mut tracker = PointerTracker::new();
        assert!(!tracker.state().visible);

        tracker.handle_move(3, 4);
        let s = tracker.state();
        assert!(s.visible);
        assert_eq!((s.x, s.y), (3, 4));
        assert!(tracker.take_dirty());
    }

    #[test]
    fn hover_flips_exactly_on_the_sample_inside_the_hotspot() {
        let mut tracker = PointerTracker::new();
        tracker.set_hotspots(vec![button_at(40, 40, 20, 20)]);

        tracker.handle_move(10, 10);
        assert!(!tracker.state().hovering);

        tracker.handle_move(39, 40);
        assert!(!tracker.state().hovering);

        tracker.handle_move(50, 50);
        assert!(tracker.state().hovering);

        tracker.handle_move(60, 50);
        assert!(!tracker.state().hovering);
    }

    #[test]
    fn focus_loss_hides_without_losing_position() {
        let mut tracker = PointerTracker::new();
        tracker.handle_move(7, 8);
        tracker.take_dirty();

        tracker.set_visible(false);
        let s = tracker.state();
        assert!(!s.visible);
        assert_eq!((s.x, s.y), (7, 8));
        assert!(tracker.take_dirty());

        tracker.set_visible(true);
        assert!(tracker.state().visible);
    }

    #[test]
    fn bursts_of_samples_coalesce_into_one_dirty_flag() {
        let mut tracker = PointerTracker::new();
        tracker.handle_move(1, 1);
        tracker.handle_move(2, 2);
        tracker.handle_move(3, 3);

        assert!(tracker.take_dirty());
        assert!(!tracker.take_dirty());
        assert_eq!((tracker.state().x, tracker.state().y), (3, 3));
    }

    #[test]
    fn rewriting_hotspots_reclassifies_in_place() {
        let mut tracker = PointerTracker::new();
        tracker.handle_move(5, 5);
        tracker.take_dirty();
        assert!(!tracker.state().hovering);

        tracker.set_hotspots(vec![button_at(0, 0, 10, 10)]);
        assert!(tracker.state().hovering);
        assert!(tracker.take_dirty());

        tracker.set_hotspots(Vec::new());
        assert!(!tracker.state().hovering);
    }
}
