//! Shared primitive types used across the insights engine.

/// Length of a trailing window, in calendar days.
pub type WindowDays = u32;

/// A row count returned by an aggregate query.
pub type Count = i64;

/// A `(label, count)` pair as produced by a grouped count.
pub type LabelCount = (String, Count);

/// Zip codes equal to this value are outside the scored geography.
pub const UNKNOWN_ZIP: &str = "Unknown";

/// Zip codes containing this marker (ASCII case-insensitive) are outside the
/// jurisdiction.
pub const OUT_OF_AREA_MARKER: &str = "Out of";
