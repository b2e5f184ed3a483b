//! Per-date grouping of episodes with cumulative rollups.

use std::collections::BTreeMap;

use episode_core::calculations::{prefix_sums, seconds_to_hours};
use episode_core::models::Episode;

// ── DailyStats ────────────────────────────────────────────────────────────────

/// Episode count and recorded time accumulated for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyStats {
    pub count: usize,
    pub total_seconds: f64,
}

impl DailyStats {
    /// Add one episode to the running totals.
    pub fn add_episode(&mut self, episode: &Episode) {
        self.count += 1;
        self.total_seconds += episode.total_time;
    }

    pub fn hours(&self) -> f64 {
        seconds_to_hours(self.total_seconds)
    }
}

// ── DailyPeriod ───────────────────────────────────────────────────────────────

/// All episodes recorded on one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPeriod {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub stats: DailyStats,
}

// ── DailyAggregate ────────────────────────────────────────────────────────────

/// Result of grouping episodes by date.
///
/// Episodes without a date are kept in `undated`: they count towards totals
/// but never appear on the date axis or in the cumulative series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyAggregate {
    /// Sorted ascending by date.
    pub periods: Vec<DailyPeriod>,
    pub undated: DailyStats,
}

impl DailyAggregate {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() && self.undated.count == 0
    }

    pub fn sorted_dates(&self) -> Vec<String> {
        self.periods.iter().map(|p| p.date.clone()).collect()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.periods.iter().map(|p| p.stats.count).collect()
    }

    pub fn hours(&self) -> Vec<f64> {
        self.periods.iter().map(|p| p.stats.hours()).collect()
    }

    /// Running episode count over the date axis.
    pub fn cumulative_counts(&self) -> Vec<usize> {
        prefix_sums(&self.counts())
    }

    /// Running hours over the date axis.
    pub fn cumulative_hours(&self) -> Vec<f64> {
        prefix_sums(&self.hours())
    }

    pub fn date_counts(&self) -> BTreeMap<String, usize> {
        self.periods
            .iter()
            .map(|p| (p.date.clone(), p.stats.count))
            .collect()
    }

    pub fn date_hours(&self) -> BTreeMap<String, f64> {
        self.periods
            .iter()
            .map(|p| (p.date.clone(), p.stats.hours()))
            .collect()
    }

    /// Episodes across dated and undated groups.
    pub fn total_episodes(&self) -> usize {
        self.periods.iter().map(|p| p.stats.count).sum::<usize>() + self.undated.count
    }
}

// ── DailyAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that groups episodes by recording date.
pub struct DailyAggregator;

impl DailyAggregator {
    /// `false` when the episode is dated strictly before `date_from`.
    ///
    /// Undated episodes always pass. Both sides are zero-padded
    /// `YYYY-MM-DD`, so string order is date order.
    pub fn within_bound(episode: &Episode, date_from: Option<&str>) -> bool {
        match (episode.date.as_deref(), date_from) {
            (Some(date), Some(bound)) => date >= bound,
            _ => true,
        }
    }

    /// Group `episodes` by date after dropping those before `date_from`.
    pub fn aggregate<'a, I>(episodes: I, date_from: Option<&str>) -> DailyAggregate
    where
        I: IntoIterator<Item = &'a Episode>,
    {
        let mut by_date: BTreeMap<String, DailyStats> = BTreeMap::new();
        let mut undated = DailyStats::default();

        for episode in episodes
            .into_iter()
            .filter(|e| Self::within_bound(e, date_from))
        {
            match &episode.date {
                Some(date) => by_date.entry(date.clone()).or_default().add_episode(episode),
                None => undated.add_episode(episode),
            }
        }

        DailyAggregate {
            periods: by_date
                .into_iter()
                .map(|(date, stats)| DailyPeriod { date, stats })
                .collect(),
            undated,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
