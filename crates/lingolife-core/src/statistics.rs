//! Vocabulary statistics for the profile view.

use serde::{Deserialize, Serialize};

use crate::model::Word;
use crate::review_log::DailyTally;

/// Default number of reviews that makes a day's goal.
pub const DEFAULT_DAILY_GOAL: u32 = 10;

/// Aggregate numbers over a user's word list and today's review activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyStats {
    pub total_words: usize,
    /// Words with at least one recorded review.
    pub reviewed_words: usize,
    pub total_known: u32,
    pub total_unknown: u32,
    /// Words reviewed today on this device.
    pub today_count: usize,
    pub today_known: u32,
    pub today_unknown: u32,
    /// `min(100, round(today_count / goal * 100))`.
    pub daily_goal_progress: u32,
}

impl VocabularyStats {
    /// Share of all recorded outcomes that were "know", in percent.
    pub fn recall_rate(&self) -> Option<f64> {
        let total = self.total_known + self.total_unknown;
        (total > 0).then(|| f64::from(self.total_known) / f64::from(total) * 100.0)
    }
}

/// Compute statistics from a word list and today's device-local activity.
pub fn compute_stats(
    words: &[Word],
    reviewed_today: usize,
    tally: DailyTally,
    daily_goal: u32,
) -> VocabularyStats {
    let total_known = words.iter().map(|w| w.known_count).sum();
    let total_unknown = words.iter().map(|w| w.unknown_count).sum();
    let reviewed_words = words.iter().filter(|w| w.review_count() > 0).count();

    VocabularyStats {
        total_words: words.len(),
        reviewed_words,
        total_known,
        total_unknown,
        today_count: reviewed_today,
        today_known: tally.known,
        today_unknown: tally.unknown,
        daily_goal_progress: goal_progress(reviewed_today, daily_goal),
    }
}

fn goal_progress(done: usize, goal: u32) -> u32 {
    if goal == 0 {
        return 100;
    }
    let pct = (done as f64 / f64::from(goal) * 100.0).round() as u32;
    pct.min(100)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{UserId, WordDraft};

    fn word(known: u32, unknown: u32) -> Word {
        let draft = WordDraft::new("w", "t");
        let mut w = Word::from_draft("id".into(), &UserId::default_user(), draft, Utc::now());
        w.known_count = known;
        w.unknown_count = unknown;
        w
    }

    #[test]
    fn aggregates_counters() {
        let words = vec![word(5, 1), word(3, 0), word(0, 0)];
        let stats = compute_stats(&words, 4, DailyTally { known: 3, unknown: 1 }, 10);
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.reviewed_words, 2);
        assert_eq!(stats.total_known, 8);
        assert_eq!(stats.total_unknown, 1);
        assert_eq!(stats.today_count, 4);
        assert_eq!(stats.daily_goal_progress, 40);
        let rate = stats.recall_rate().unwrap();
        assert!((rate - 88.888).abs() < 0.01);
    }

    #[test]
    fn goal_progress_caps_at_100() {
        assert_eq!(goal_progress(15, 10), 100);
        assert_eq!(goal_progress(0, 10), 0);
        assert_eq!(goal_progress(1, 3), 33);
        assert_eq!(goal_progress(3, 0), 100);
    }

    #[test]
    fn no_reviews_has_no_recall_rate() {
        let stats = compute_stats(&[word(0, 0)], 0, DailyTally::default(), DEFAULT_DAILY_GOAL);
        assert!(stats.recall_rate().is_none());
    }
}
