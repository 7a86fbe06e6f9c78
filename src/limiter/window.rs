use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// A single recorded spend against a quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageEvent {
    pub at: Instant,
    pub amount: u64,
}

/// Time-ordered record of recent quota spends.
///
/// Events are only ever appended at "now", so the deque stays sorted by
/// timestamp without re-sorting. Eviction is lazy: callers prune at the
/// start of a read, never from a background timer.
#[derive(Debug)]
pub struct UsageWindow {
    events: VecDeque<UsageEvent>,
    duration: Duration,
}

impl UsageWindow {
    pub fn new(duration: Duration) -> Self {
        Self {
            events: VecDeque::new(),
            duration,
        }
    }

    /// Append a spend observed at `now`.
    pub fn push(&mut self, now: Instant, amount: u64) {
        self.events.push_back(UsageEvent { at: now, amount });
    }

    /// Drop every event whose age has reached the window duration.
    ///
    /// Retained events always satisfy `at > now - duration`.
    pub fn evict(&mut self, now: Instant) {
        while let Some(&front) = self.events.front() {
            if now.duration_since(front.at) >= self.duration {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// Sum of retained amounts. Evict first for a window-accurate figure.
    pub fn total(&self) -> u64 {
        self.events.iter().map(|e| e.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest instant at which at least `deficit` units will have been
    /// freed by eviction, or `None` if the retained events cannot cover
    /// the deficit.
    pub fn release_instant(&self, deficit: u64) -> Option<Instant> {
        let mut freed = 0u64;
        for event in &self.events {
            freed += event.amount;
            if freed >= deficit {
                return Some(event.at + self.duration);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn empty_window_totals_zero() {
        let window = UsageWindow::new(WINDOW);
        assert_eq!(window.total(), 0);
        assert!(window.is_empty());
        assert_eq!(window.release_instant(1), None);
    }

    #[test]
    fn total_sums_retained_events() {
        let t0 = Instant::now();
        let mut window = UsageWindow::new(WINDOW);
        window.push(t0, 30);
        window.push(t0 + Duration::from_secs(10), 40);
        window.push(t0 + Duration::from_secs(20), 50);
        assert_eq!(window.total(), 120);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn eviction_boundary_is_exact() {
        let t0 = Instant::now();
        let mut window = UsageWindow::new(WINDOW);
        window.push(t0, 90);

        // One millisecond before expiry the event is retained.
        window.evict(t0 + WINDOW - Duration::from_millis(1));
        assert_eq!(window.total(), 90);

        // At exactly window age it is gone.
        window.evict(t0 + WINDOW);
        assert_eq!(window.total(), 0);
    }

    #[test]
    fn eviction_is_per_event() {
        let t0 = Instant::now();
        let mut window = UsageWindow::new(WINDOW);
        window.push(t0, 10);
        window.push(t0 + Duration::from_secs(30), 20);

        window.evict(t0 + Duration::from_secs(61));
        assert_eq!(window.total(), 20);

        window.evict(t0 + Duration::from_secs(91));
        assert_eq!(window.total(), 0);
    }

    #[test]
    fn release_instant_crosses_deficit_threshold() {
        let t0 = Instant::now();
        let mut window = UsageWindow::new(WINDOW);
        window.push(t0, 30);
        window.push(t0 + Duration::from_secs(10), 40);
        window.push(t0 + Duration::from_secs(20), 50);

        // 30 alone does not cover a deficit of 60; the second event does.
        assert_eq!(
            window.release_instant(60),
            Some(t0 + Duration::from_secs(10) + WINDOW)
        );
        // The first event covers a deficit of 30 on its own.
        assert_eq!(window.release_instant(30), Some(t0 + WINDOW));
        // More than everything retained.
        assert_eq!(window.release_instant(121), None);
    }
}
