use std::ops::Range;

use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;

/// Formats an axis value with a base-1000 magnitude suffix, zero decimal
/// places. Values under 1000 are rendered as plain integers; values past the
/// largest suffix clamp to it.
pub fn int_to_human(v: f64) -> String {
    const SUFFIXES: [&str; 9] = ["", "k", "M", "G", "T", "P", "E", "Z", "Y"];

    if v < 1000.0 {
        return format!("{}", v as i64);
    }

    let order = ((v.log10() / 3.0).floor() as usize).min(SUFFIXES.len() - 1);
    format!("{:.0}{}", v / 1000f64.powi(order as i32), SUFFIXES[order])
}

/// A linear f64 coordinate whose axis ticks sit at a fixed set of values
/// (the vertex counts the benchmark actually ran at) instead of the evenly
/// spaced defaults. Falls back to the default key points when the mesh asks
/// for fewer labels than there are ticks.
pub struct FixedTicks {
    inner: RangedCoordf64,
    ticks: Vec<f64>,
}

impl FixedTicks {
    pub fn new(range: Range<f64>, ticks: Vec<f64>) -> Self {
        Self {
            inner: range.into(),
            ticks,
        }
    }
}

impl Ranged for FixedTicks {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if self.ticks.len() <= hint.max_num_points() {
            self.ticks.clone()
        } else {
            self.inner.key_points(hint)
        }
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_to_human_plain_integers() {
        assert_eq!(int_to_human(0.0), "0");
        assert_eq!(int_to_human(42.0), "42");
        assert_eq!(int_to_human(999.0), "999");
    }

    #[test]
    fn test_int_to_human_suffixes() {
        assert_eq!(int_to_human(1000.0), "1k");
        assert_eq!(int_to_human(2575.0), "3k");
        assert_eq!(int_to_human(1_500_000.0), "2M");
        assert_eq!(int_to_human(3_000_000_000.0), "3G");
    }

    #[test]
    fn test_int_to_human_clamps_past_largest_suffix() {
        assert_eq!(int_to_human(1e27), "1000Y");
    }

    #[test]
    fn test_fixed_ticks_used_when_budget_allows() {
        let coord = FixedTicks::new(0.0..1000.0, vec![100.0, 200.0, 300.0]);
        assert_eq!(coord.key_points(20), vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn test_fixed_ticks_fall_back_on_tight_budget() {
        let coord = FixedTicks::new(0.0..1000.0, vec![100.0, 200.0, 300.0]);
        assert!(coord.key_points(1).len() <= 1);
    }

    #[test]
    fn test_fixed_ticks_map_is_linear() {
        let coord = FixedTicks::new(0.0..100.0, vec![25.0]);
        let plain: RangedCoordf64 = (0.0..100.0).into();
        assert_eq!(coord.map(&40.0, (0, 1000)), plain.map(&40.0, (0, 1000)));
    }
}
