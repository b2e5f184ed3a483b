use std::ops::Add;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Convert seconds to hours.
pub fn seconds_to_hours(seconds: f64) -> f64 {
    seconds / SECONDS_PER_HOUR
}

// ── DurationStats ─────────────────────────────────────────────────────────────

/// Summary statistics over a sequence of segment durations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

impl DurationStats {
    /// Compute total / mean / max / min over `durations`.
    ///
    /// Returns `None` for an empty slice: mean, max and min are undefined
    /// there and callers must decide how to report that.
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        let (&first, rest) = durations.split_first()?;

        let (total, max, min) = rest
            .iter()
            .fold((first, first, first), |(total, max, min), &d| {
                (total + d, max.max(d), min.min(d))
            });
        let count = durations.len();
        // Rounding in the division may land a hair outside [min, max].
        let mean = (total / count as f64).clamp(min, max);

        Some(Self {
            count,
            total,
            mean,
            max,
            min,
        })
    }
}

// ── Prefix sums ───────────────────────────────────────────────────────────────

/// Running totals: element `i` is the sum of `values[..=i]`.
pub fn prefix_sums<T>(values: &[T]) -> Vec<T>
where
    T: Copy + Default + Add<Output = T>,
{
    values
        .iter()
        .scan(T::default(), |acc, &v| {
            *acc = *acc + v;
            Some(*acc)
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── DurationStats ────────────────────────────────────────────────────────

    #[test]
    fn test_duration_stats_empty_is_none() {
        assert!(DurationStats::from_durations(&[]).is_none());
    }

    #[test]
    fn test_duration_stats_single_value() {
        let stats = DurationStats::from_durations(&[12.5]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.total, 12.5);
        assert_eq!(stats.mean, 12.5);
        assert_eq!(stats.max, 12.5);
        assert_eq!(stats.min, 12.5);
    }

    #[test]
    fn test_duration_stats_basic() {
        let stats = DurationStats::from_durations(&[10.0, 30.0, 20.0]).unwrap();
        assert_eq!(stats.count, 3);
        assert!((stats.total - 60.0).abs() < 1e-9);
        assert!((stats.mean - 20.0).abs() < 1e-9);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.min, 10.0);
    }

    #[test]
    fn test_duration_stats_negative_duration_tolerated() {
        let stats = DurationStats::from_durations(&[5.0, -2.0]).unwrap();
        assert!((stats.total - 3.0).abs() < 1e-9);
        assert_eq!(stats.min, -2.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_duration_stats_mean_between_min_and_max() {
        let samples: &[&[f64]] = &[
            &[0.1, 0.1, 0.1],
            &[1.0, 2.0, 3.0, 4.0],
            &[1e-9, 1e9],
            &[-5.0, -5.0],
            &[0.3, 0.7, 0.2, 0.9, 0.1],
        ];
        for durations in samples {
            let stats = DurationStats::from_durations(durations).unwrap();
            assert!(stats.min <= stats.mean, "{durations:?}");
            assert!(stats.mean <= stats.max, "{durations:?}");
            let expected: f64 = durations.iter().sum();
            assert!((stats.total - expected).abs() < 1e-6, "{durations:?}");
        }
    }

    // ── prefix_sums ──────────────────────────────────────────────────────────

    #[test]
    fn test_prefix_sums_counts() {
        assert_eq!(prefix_sums(&[2usize, 1, 4]), vec![2, 3, 7]);
    }

    #[test]
    fn test_prefix_sums_hours() {
        let sums = prefix_sums(&[2.0f64, 1.0, 0.5]);
        assert_eq!(sums, vec![2.0, 3.0, 3.5]);
    }

    #[test]
    fn test_prefix_sums_empty() {
        assert!(prefix_sums::<usize>(&[]).is_empty());
    }

    #[test]
    fn test_seconds_to_hours() {
        assert!((seconds_to_hours(10_800.0) - 3.0).abs() < 1e-12);
        assert_eq!(seconds_to_hours(0.0), 0.0);
    }
}
