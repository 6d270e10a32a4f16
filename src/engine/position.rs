use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//how a position left the book, or why it never entered it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitKind {
    //target reached
    Win,
    //stop reached
    Loss,
    //entry suppressed by the overlap policy
    Overlap,
    //entry suppressed by the concurrent lot limit
    LotLimit,
    //entered but never resolved before the series ended
    Open,
}

impl ExitKind {
    //rejected entries record a suppressed signal and never carry prices
    pub fn is_rejection(&self) -> bool {
        matches!(self, ExitKind::Overlap | ExitKind::LotLimit)
    }

    //resolved trades count toward win/loss statistics
    pub fn is_resolved(&self) -> bool {
        matches!(self, ExitKind::Win | ExitKind::Loss)
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitKind::Win => "Win",
            ExitKind::Loss => "Loss",
            ExitKind::Overlap => "Overlap",
            ExitKind::LotLimit => "Lot limit",
            ExitKind::Open => "Open",
        };
        write!(f, "{}", label)
    }
}

//one long or short trade attempt, created and fully resolved by the tracker
//in a single call and never mutated afterwards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub entry_price: Option<f64>,
    pub target_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub exit_kind: ExitKind,
    pub pnl: Option<f64>,

    //net pyramided lot count recorded at entry time, negative for shorts
    pub open_lots: i64,
}

impl Position {
    //a suppressed entry: no prices, no exit, no pnl
    pub fn rejected(entry_time: DateTime<Utc>, kind: ExitKind, open_lots: i64) -> Self {
        debug_assert!(kind.is_rejection());
        Position {
            entry_time,
            exit_time: None,
            entry_price: None,
            target_price: None,
            stop_price: None,
            exit_kind: kind,
            pnl: None,
            open_lots,
        }
    }

    //an entry that reached the end of the series without touching target or
    //stop; pnl of zero keeps it in the pnl distribution and turnover
    pub fn left_open(
        entry_time: DateTime<Utc>,
        entry_price: f64,
        target_price: f64,
        stop_price: f64,
        open_lots: i64,
    ) -> Self {
        Position {
            entry_time,
            exit_time: None,
            entry_price: Some(entry_price),
            target_price: Some(target_price),
            stop_price: Some(stop_price),
            exit_kind: ExitKind::Open,
            pnl: Some(0.0),
            open_lots,
        }
    }

    //a fully resolved trade
    #[allow(clippy::too_many_arguments)]
    pub fn resolved(
        entry_time: DateTime<Utc>,
        exit_time: DateTime<Utc>,
        entry_price: f64,
        target_price: f64,
        stop_price: f64,
        exit_kind: ExitKind,
        pnl: f64,
        open_lots: i64,
    ) -> Self {
        debug_assert!(exit_kind.is_resolved());
        Position {
            entry_time,
            exit_time: Some(exit_time),
            entry_price: Some(entry_price),
            target_price: Some(target_price),
            stop_price: Some(stop_price),
            exit_kind,
            pnl: Some(pnl),
            open_lots,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.exit_kind.is_resolved()
    }

    //duration from entry to exit, present only for resolved trades
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_rejected_carries_no_prices_or_pnl() {
        let pos = Position::rejected(ts(10), ExitKind::Overlap, 0);
        assert_eq!(pos.entry_price, None);
        assert_eq!(pos.target_price, None);
        assert_eq!(pos.stop_price, None);
        assert_eq!(pos.exit_time, None);
        assert_eq!(pos.pnl, None);
        assert!(!pos.is_resolved());
    }

    #[test]
    fn test_left_open_has_zero_pnl() {
        let pos = Position::left_open(ts(10), 100.0, 109.0, 97.0, 2);
        assert_eq!(pos.pnl, Some(0.0));
        assert_eq!(pos.exit_time, None);
        assert_eq!(pos.duration(), None);
    }

    #[test]
    fn test_resolved_has_exit_and_duration() {
        let pos = Position::resolved(ts(10), ts(70), 100.0, 109.0, 97.0, ExitKind::Win, 900.0, 0);
        assert!(pos.is_resolved());
        assert_eq!(pos.duration(), Some(chrono::Duration::seconds(60)));
        assert!(pos.exit_time.unwrap() > pos.entry_time);
    }
}
