use std::time::Duration;

/// Debounces raw effect notifications of one kind into counted episodes.
///
/// An episode is ongoing while notifications keep arriving within the gap of
/// each other. It is counted the moment it opens. Closing is lazy: there is no
/// close event, a notification simply opens a fresh episode once the gap since
/// the previous notification was exceeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeCounter {
    gap: Duration,
    episodes: u32,
    last_effect: Option<Duration>,
    ongoing: bool,
}

impl EpisodeCounter {
    /// Creates an idle counter using the provided inactivity gap.
    #[must_use]
    pub const fn new(gap: Duration) -> Self {
        Self {
            gap,
            episodes: 0,
            last_effect: None,
            ongoing: false,
        }
    }

    /// Number of episodes opened since the last reset.
    #[must_use]
    pub const fn episodes(&self) -> u32 {
        self.episodes
    }

    /// Time of the most recent notification.
    #[must_use]
    pub const fn last_effect(&self) -> Option<Duration> {
        self.last_effect
    }

    /// Reports whether an episode is ongoing at `now`.
    #[must_use]
    pub fn is_ongoing(&self, now: Duration) -> bool {
        self.ongoing && self.within_gap(now)
    }

    /// Records a notification, returning whether it opened a new episode.
    pub fn notify(&mut self, now: Duration) -> bool {
        let opened = !self.is_ongoing(now);
        if opened {
            self.ongoing = true;
            self.episodes = self.episodes.saturating_add(1);
        }
        self.last_effect = Some(now);
        opened
    }

    /// Closes the ongoing episode once the gap elapsed without notifications.
    pub fn close_if_idle(&mut self, now: Duration) {
        if self.ongoing && !self.within_gap(now) {
            self.ongoing = false;
        }
    }

    fn within_gap(&self, now: Duration) -> bool {
        self.last_effect
            .is_some_and(|last| now.saturating_sub(last) <= self.gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAP: Duration = Duration::from_millis(750);

    #[test]
    fn burst_within_gap_counts_once() {
        let mut counter = EpisodeCounter::new(GAP);
        let opened: Vec<bool> = [0, 300, 500, 1_250]
            .into_iter()
            .map(|millis| counter.notify(Duration::from_millis(millis)))
            .collect();

        assert_eq!(opened, vec![true, false, false, false]);
        assert_eq!(counter.episodes(), 1);
    }

    #[test]
    fn lazy_close_waits_for_strictly_more_than_gap() {
        let mut counter = EpisodeCounter::new(GAP);
        let _ = counter.notify(Duration::from_secs(1));

        counter.close_if_idle(Duration::from_millis(1_750));
        assert!(counter.is_ongoing(Duration::from_millis(1_750)));

        counter.close_if_idle(Duration::from_millis(1_751));
        assert!(!counter.is_ongoing(Duration::from_millis(1_751)));
        assert!(counter.notify(Duration::from_secs(5)));
        assert_eq!(counter.episodes(), 2);
    }
}
