// Copyright (c) 2026 n0cturne

use std::time::{Duration, Instant};

/// Per-instance frame pacer. Every animation owns one; there is no shared
/// scheduler. A cancelled clock never reports a due tick again; cancel is
/// the unmount edge for the animation that owns it.
#[derive(Clone, Debug)]
pub struct FrameClock {
    period: Duration,
    deadline: Option<Instant>,
}

impl FrameClock {
    pub fn start(fps: f64, now: Instant) -> Self {
        let fps = fps.clamp(1.0, 240.0);
        let period = Duration::from_secs_f64(1.0 / fps);
        Self {
            period,
            deadline: Some(now + period),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.deadline.is_none()
    }

    pub fn due(&self, now: Instant) -> bool {
        match self.deadline {
            Some(d) => now >= d,
            None => false,
        }
    }

    /// Consume the pending tick if one is due. When the loop has fallen
    /// behind, the next deadline re-bases to `now` instead of queuing a
    /// burst of make-up ticks.
    pub fn advance(&mut self, now: Instant) -> u32 {
        let Some(deadline) = self.deadline else {
            return 0;
        };
        if now < deadline {
            return 0;
        }

        let mut next = deadline + self.period;
        if now > next {
            next = now;
        }
        self.deadline = Some(next);
        1
    }

    /// Stop the clock permanently. Idempotent.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_due_until_period_elapses() {
        let t0 = Instant::now();
        let clock = FrameClock::start(60.0, t0);
        assert!(!clock.due(t0));
        assert!(clock.due(t0 + Duration::from_millis(17)));
    }

    #[test]
    fn advance_consumes_exactly_one_tick() {
        let t0 = Instant::now();
        let mut clock = FrameClock::start(60.0, t0);
        let t1 = t0 + Duration::from_millis(17);

        assert_eq!(clock.advance(t1), 1);
        assert!(!clock.due(t1));
        assert_eq!(clock.advance(t1), 0);
    }

    #[test]
    fn stalled_clock_rebases_instead_of_bursting() {
        let t0 = Instant::now();
        let mut clock = FrameClock::start(60.0, t0);
        let late = t0 + Duration::from_secs(3);

        assert_eq!(clock.advance(late), 1);
        // One more tick is immediately due, then pacing resumes.
        assert_eq!(clock.advance(late), 1);
        assert_eq!(clock.advance(late), 0);
        assert!(clock.due(late + clock.period()));
    }

    #[test]
    fn cancelled_clock_never_fires_again() {
        let t0 = Instant::now();
        let mut clock = FrameClock::start(60.0, t0);
        clock.cancel();

        let far = t0 + Duration::from_secs(60);
        assert!(clock.is_cancelled());
        assert!(!clock.due(far));
        assert_eq!(clock.advance(far), 0);
        assert_eq!(clock.deadline(), None);

        clock.cancel();
        assert!(clock.is_cancelled());
    }

    #[test]
    fn fps_is_clamped_to_sane_bounds() {
        let t0 = Instant::now();
        assert_eq!(
            FrameClock::start(0.0, t0).period(),
            Duration::from_secs_f64(1.0)
        );
        assert_eq!(
            FrameClock::start(1000.0, t0).period(),
            Duration::from_secs_f64(1.0 / 240.0)
        );
    }
}
