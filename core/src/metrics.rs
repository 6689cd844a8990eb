//! Small numeric helpers shared by the stats builders and the engine.
//!
//! RULE: every ratio in the engine goes through these helpers so that a
//! zero denominator yields 0.0 instead of NaN or infinity.

/// Round to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `part / whole * 100`, or 0.0 when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

/// Percent change from `baseline` to `current`, or 0.0 when `baseline` is
/// not positive.
pub fn percent_change(current: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (current - baseline) / baseline * 100.0
    } else {
        0.0
    }
}

/// Integer with thousands separators, e.g. `12,345`.
pub fn with_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}
