//! Per-user trade statistics model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of history entries kept per user; older entries are
/// silently dropped.
pub const HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Win,
    Loss,
}

/// One recorded trade outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEntry {
    pub at: DateTime<Utc>,
    pub kind: TradeKind,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Running totals plus a bounded, newest-first history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub total_win: i64,
    #[serde(default)]
    pub total_loss: i64,
    #[serde(default)]
    pub history: Vec<TradeEntry>,
}

impl UserStats {
    /// Record an outcome, updating the running sum and capping history
    pub fn record(&mut self, kind: TradeKind, amount: i64, note: Option<String>, now: DateTime<Utc>) {
        match kind {
            TradeKind::Win => self.total_win += amount,
            TradeKind::Loss => self.total_loss += amount,
        }
        self.history.insert(
            0,
            TradeEntry {
                at: now,
                kind,
                amount,
                note,
            },
        );
        self.history.truncate(HISTORY_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_totals_and_caps_history() {
        let now = Utc::now();
        let mut stats = UserStats::default();
        for i in 0..(HISTORY_CAP as i64 + 10) {
            stats.record(TradeKind::Win, i + 1, None, now);
        }
        stats.record(TradeKind::Loss, 5, Some("slippage".to_string()), now);

        assert_eq!(stats.history.len(), HISTORY_CAP);
        assert_eq!(stats.total_loss, 5);
        // Newest first
        assert_eq!(stats.history[0].kind, TradeKind::Loss);
        assert_eq!(stats.history[0].amount, 5);
    }
}
