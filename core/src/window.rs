//! Anchored trailing windows.
//!
//! RULE: a window is always anchored to the latest date of ONE entity table,
//! never to wall-clock time. Crimes, arrests and calls each resolve their own
//! anchor, so a lagging feed simply shifts its own window back.
//!
//! A window of `days` covers `anchor - (days - 1) ..= anchor`.

use crate::types::WindowDays;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub anchor: NaiveDate,
    pub days:   WindowDays,
}

impl Window {
    pub fn ending_at(anchor: NaiveDate, days: WindowDays) -> Self {
        Self { anchor, days }
    }

    /// `None` when the table has no rows yet (no max date to anchor on).
    pub fn anchored(anchor: Option<NaiveDate>, days: WindowDays) -> Option<Self> {
        anchor.map(|a| Self::ending_at(a, days))
    }

    /// First date inside the window (inclusive).
    pub fn start(&self) -> NaiveDate {
        self.anchor - Duration::days(i64::from(self.days) - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.anchor
    }

    /// The last `n` days of this window, sharing its anchor.
    pub fn trailing(&self, n: WindowDays) -> Self {
        Self::ending_at(self.anchor, n.min(self.days))
    }

    /// Everything in this window before its last `n` days.
    /// `None` when nothing is left over.
    pub fn before_trailing(&self, n: WindowDays) -> Option<Self> {
        if self.days <= n {
            return None;
        }
        Some(Self::ending_at(
            self.anchor - Duration::days(i64::from(n)),
            self.days - n,
        ))
    }

    /// The window of equal length that ends the day before this one starts.
    pub fn preceding(&self) -> Self {
        Self::ending_at(self.start() - Duration::days(1), self.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_is_inclusive_of_both_ends() {
        let w = Window::ending_at(d(2025, 6, 30), 30);
        assert_eq!(w.start(), d(2025, 6, 1));
        assert!(w.contains(d(2025, 6, 1)));
        assert!(w.contains(d(2025, 6, 30)));
        assert!(!w.contains(d(2025, 5, 31)));
        assert!(!w.contains(d(2025, 7, 1)));
    }

    #[test]
    fn single_day_window_is_just_the_anchor() {
        let w = Window::ending_at(d(2025, 1, 15), 1);
        assert_eq!(w.start(), w.anchor);
    }

    #[test]
    fn trailing_and_remainder_partition_the_window() {
        let w = Window::ending_at(d(2025, 6, 30), 30);
        let last7 = w.trailing(7);
        let rest = w.before_trailing(7).unwrap();

        assert_eq!(last7.start(), d(2025, 6, 24));
        assert_eq!(rest.anchor, d(2025, 6, 23));
        assert_eq!(rest.start(), w.start());
        assert_eq!(rest.days + last7.days, w.days);
    }

    #[test]
    fn nothing_before_trailing_when_window_is_short() {
        let w = Window::ending_at(d(2025, 6, 30), 7);
        assert!(w.before_trailing(7).is_none());
    }

    #[test]
    fn preceding_window_abuts_current_one() {
        let w = Window::ending_at(d(2025, 6, 30), 30);
        let prev = w.preceding();
        assert_eq!(prev.anchor, d(2025, 5, 31));
        assert_eq!(prev.start(), d(2025, 5, 2));
    }

    #[test]
    fn empty_table_has_no_window() {
        assert!(Window::anchored(None, 30).is_none());
    }
}
