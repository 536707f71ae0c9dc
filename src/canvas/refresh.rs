use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Timer {
    interval: Duration,
    last_fire: Instant,
}

impl Timer {
    fn deadline(&self) -> Instant {
        self.last_fire + self.interval
    }
}

/// Per-card refresh timers.
///
/// The scheduler follows the live card set: [`RefreshScheduler::sync`] arms
/// timers for new cards and drops the timers of cards that disappeared, so a
/// deleted card never fires again.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    timers: HashMap<String, Timer>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.timers.contains_key(card_id)
    }

    /// Match the timers to `cards` (`(card_id, interval)` pairs). New cards are
    /// armed at `now`, changed intervals re-arm, cards without an interval or
    /// no longer present are cancelled.
    pub fn sync<'a>(
        &mut self,
        cards: impl IntoIterator<Item = (&'a str, Option<Duration>)>,
        now: Instant,
    ) {
        let mut next = HashMap::new();
        for (card_id, interval) in cards {
            let Some(interval) = interval.filter(|i| !i.is_zero()) else {
                continue;
            };
            let timer = match self.timers.get(card_id) {
                Some(t) if t.interval == interval => *t,
                _ => Timer {
                    interval,
                    last_fire: now,
                },
            };
            next.insert(card_id.to_string(), timer);
        }
        let cancelled = self.timers.keys().filter(|id| !next.contains_key(*id)).count();
        if cancelled > 0 {
            tracing::debug!(cancelled, "refresh timers cancelled");
        }
        self.timers = next;
    }

    /// Ids whose interval elapsed by `now`. Their timers are re-armed.
    pub fn due(&mut self, now: Instant) -> Vec<String> {
        let mut due = Vec::new();
        for (card_id, timer) in self.timers.iter_mut() {
            if now >= timer.deadline() {
                timer.last_fire = now;
                due.push(card_id.clone());
            }
        }
        due.sort();
        due
    }

    /// Time until the earliest timer fires.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.timers
            .values()
            .map(|t| t.deadline().saturating_duration_since(now))
            .min()
    }

    pub fn cancel_all(&mut self) {
        if !self.timers.is_empty() {
            tracing::debug!(timers = self.timers.len(), "all refresh timers cancelled");
        }
        self.timers.clear();
    }
}
