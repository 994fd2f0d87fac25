//! The on-screen kill feed.

use std::collections::VecDeque;
use std::time::Duration;

use rallypoint_tick::Deadlines;

/// Deadline key: drop the oldest line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExpireOldest;

/// Lines such as "Ana killed Ben." that disappear after a while.
///
/// Every line schedules one removal of the oldest line. While more lines
/// are queued than fit on screen the removal is pushed out to
/// `duration × (2 + ⌊n / visible⌋ − 1)` so bursts stay readable.
#[derive(Debug, Clone)]
pub struct KillFeed {
    duration: Duration,
    visible: usize,
    lines: VecDeque<String>,
    expiry: Deadlines<ExpireOldest>,
}

impl KillFeed {
    pub fn new(duration: Duration, visible: usize) -> Self {
        Self {
            duration,
            visible: visible.max(1),
            lines: VecDeque::new(),
            expiry: Deadlines::new(),
        }
    }

    /// Queues a line; returns how long until its removal fires.
    pub fn push(&mut self, line: impl Into<String>) -> Duration {
        self.lines.push_back(line.into());
        let n = self.lines.len();
        let delay = if n > self.visible {
            let extra = (n / self.visible) as u32 - 1;
            self.duration * (2 + extra)
        } else {
            self.duration
        };
        self.expiry.schedule(delay, ExpireOldest);
        delay
    }

    /// Advances the feed clock. Returns `true` if any line went away.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let mut changed = false;
        for _ in self.expiry.advance(dt) {
            changed |= self.lines.pop_front().is_some();
        }
        changed
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// All lines, oldest first, one per row.
    pub fn text(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.expiry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_push_line_expires_after_duration() {
        let mut feed = KillFeed::new(3 * SECOND, 4);
        feed.push("Ana spawned.");

        assert!(!feed.tick(2 * SECOND));
        assert_eq!(feed.text(), "Ana spawned.");
        assert!(feed.tick(SECOND));
        assert!(feed.is_empty());
    }

    #[test]
    fn test_push_over_visible_extends_delay() {
        let mut feed = KillFeed::new(3 * SECOND, 4);
        let delays: Vec<_> = (0..9).map(|i| feed.push(format!("line {i}"))).collect();

        // n = 5..7 → ×2, n = 8..9 → ×3.
        assert_eq!(delays[..4], [3 * SECOND; 4]);
        assert_eq!(delays[4..7], [6 * SECOND; 3]);
        assert_eq!(delays[7..], [9 * SECOND; 2]);
    }

    #[test]
    fn test_tick_removes_oldest_first() {
        let mut feed = KillFeed::new(3 * SECOND, 4);
        feed.push("first");
        feed.tick(SECOND);
        feed.push("second");
        feed.tick(2 * SECOND);

        assert_eq!(feed.lines().collect::<Vec<_>>(), ["second"]);
    }
}
