//! Exact-match metadata filtering over derived episodes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, StatsError};
use crate::models::Episode;

/// Conjunctive set of `field == value` constraints.
///
/// Fields without a constraint are wildcards. Comparison is type-sensitive:
/// a string constraint never matches a numeric field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaFilter {
    conditions: BTreeMap<String, Value>,
}

impl MetaFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from `key=value` tokens.
    ///
    /// Malformed tokens are logged and skipped. When a key repeats, the last
    /// token wins.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for token in tokens {
            match parse_token(token.as_ref()) {
                Ok((key, value)) => {
                    if !Episode::FIELD_NAMES.contains(&key.as_str()) {
                        warn!(
                            "Filter key \"{}\" is not an episode field; no episode will match",
                            key
                        );
                    }
                    filter.insert(key, Value::String(value));
                }
                Err(e) => warn!("Ignoring filter token: {}", e),
            }
        }
        filter
    }

    /// Add or replace the constraint on `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.conditions.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn conditions(&self) -> &BTreeMap<String, Value> {
        &self.conditions
    }

    /// `true` when every constraint holds for `episode`.
    ///
    /// A constrained field the episode does not have never matches.
    pub fn matches(&self, episode: &Episode) -> bool {
        self.conditions
            .iter()
            .all(|(key, expected)| episode.field(key).as_ref() == Some(expected))
    }

    /// The episodes that satisfy the filter, in input order.
    pub fn apply(&self, episodes: &[Episode]) -> Vec<Episode> {
        if self.is_empty() {
            return episodes.to_vec();
        }
        episodes
            .iter()
            .filter(|episode| self.matches(episode))
            .cloned()
            .collect()
    }
}

/// Split a `key=value` token on its first `=`.
///
/// Tokens without `=` or with an empty key are
/// [`StatsError::InvalidFilterSyntax`].
pub fn parse_token(token: &str) -> Result<(String, String)> {
    match token.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(StatsError::InvalidFilterSyntax(token.to_string())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_episode(location: &str, hsr_id: &str, date: Option<&str>) -> Episode {
        Episode {
            date: date.map(str::to_string),
            total_time: 60.0,
            mean_duration: 30.0,
            max_duration: 40.0,
            min_duration: 20.0,
            total_segments: 2,
            suboptimal_segments: 0,
            bag_path: format!("{location}-{hsr_id}.bag").into(),
            hsr_id: hsr_id.to_string(),
            version: "1.0".into(),
            location_name: location.into(),
            interface: "vr".into(),
            git_branch: "main".into(),
            git_hash: "abc".into(),
        }
    }

    fn mixed_episodes() -> Vec<Episode> {
        vec![
            make_episode("siteA", "1", Some("2024-06-01")),
            make_episode("siteB", "1", Some("2024-06-01")),
            make_episode("siteA", "2", None),
            make_episode("siteC", "2", Some("2024-06-02")),
        ]
    }

    // ── parse_token ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_token_basic() {
        assert_eq!(
            parse_token("location_name=siteA").unwrap(),
            ("location_name".to_string(), "siteA".to_string())
        );
    }

    #[test]
    fn test_parse_token_splits_on_first_equals() {
        assert_eq!(
            parse_token("git_branch=feature=x").unwrap(),
            ("git_branch".to_string(), "feature=x".to_string())
        );
    }

    #[test]
    fn test_parse_token_empty_value_allowed() {
        assert_eq!(
            parse_token("version=").unwrap(),
            ("version".to_string(), String::new())
        );
    }

    #[test]
    fn test_parse_token_without_separator() {
        let err = parse_token("location_name").unwrap_err();
        assert!(matches!(err, StatsError::InvalidFilterSyntax(_)));
    }

    #[test]
    fn test_parse_token_empty_key() {
        assert!(parse_token("=siteA").is_err());
    }

    // ── from_tokens ──────────────────────────────────────────────────────────

    #[test]
    fn test_from_tokens_skips_invalid() {
        let filter = MetaFilter::from_tokens(["location_name=siteA", "garbage"]);
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.conditions()["location_name"], json!("siteA"));
    }

    #[test]
    fn test_from_tokens_all_invalid_is_empty() {
        let filter = MetaFilter::from_tokens(["garbage", "=x"]);
        assert!(filter.is_empty());
        let episodes = mixed_episodes();
        assert_eq!(filter.apply(&episodes), episodes);
    }

    #[test]
    fn test_from_tokens_last_duplicate_wins() {
        let filter = MetaFilter::from_tokens(["location_name=siteA", "location_name=siteB"]);
        assert_eq!(filter.len(), 1);
        assert_eq!(filter.conditions()["location_name"], json!("siteB"));
    }

    // ── apply / matches ──────────────────────────────────────────────────────

    #[test]
    fn test_apply_single_key() {
        let filter = MetaFilter::from_tokens(["location_name=siteA"]);
        let kept = filter.apply(&mixed_episodes());
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|e| e.location_name == "siteA"));
    }

    #[test]
    fn test_apply_is_conjunctive() {
        let filter = MetaFilter::from_tokens(["location_name=siteA", "hsr_id=2"]);
        let kept = filter.apply(&mixed_episodes());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].hsr_id, "2");
        assert_eq!(kept[0].location_name, "siteA");
    }

    #[test]
    fn test_apply_empty_filter_is_identity() {
        let episodes = mixed_episodes();
        assert_eq!(MetaFilter::new().apply(&episodes), episodes);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let filter = MetaFilter::from_tokens(["hsr_id=1"]);
        let once = filter.apply(&mixed_episodes());
        let twice = filter.apply(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_preserves_order() {
        let filter = MetaFilter::from_tokens(["hsr_id=2"]);
        let kept = filter.apply(&mixed_episodes());
        let locations: Vec<String> = kept.iter().map(|e| e.location_name.to_string()).collect();
        assert_eq!(locations, vec!["siteA", "siteC"]);
    }

    #[test]
    fn test_unknown_key_excludes_everything() {
        let filter = MetaFilter::from_tokens(["operator=alice"]);
        assert!(filter.apply(&mixed_episodes()).is_empty());
    }

    #[test]
    fn test_string_value_never_matches_numeric_field() {
        let filter = MetaFilter::from_tokens(["total_segments=2"]);
        assert!(filter.apply(&mixed_episodes()).is_empty());
    }

    #[test]
    fn test_numeric_version_only_matches_typed_value() {
        let mut episode = make_episode("siteA", "1", Some("2024-06-01"));
        episode.version = json!(1.2).into();
        let episodes = vec![episode];

        let from_cli = MetaFilter::from_tokens(["version=1.2"]);
        assert!(from_cli.apply(&episodes).is_empty());

        let mut typed = MetaFilter::new();
        typed.insert("version", 1.2);
        assert_eq!(typed.apply(&episodes).len(), 1);
    }

    #[test]
    fn test_typed_value_matches_numeric_field() {
        let mut filter = MetaFilter::new();
        filter.insert("total_segments", 2);
        assert_eq!(filter.apply(&mixed_episodes()).len(), 4);
    }

    #[test]
    fn test_date_filter_does_not_match_null_date() {
        let filter = MetaFilter::from_tokens(["location_name=siteA", "date=2024-06-01"]);
        let kept = filter.apply(&mixed_episodes());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_apply_does_not_mutate_input() {
        let episodes = mixed_episodes();
        let snapshot = episodes.clone();
        let _ = MetaFilter::from_tokens(["location_name=siteB"]).apply(&episodes);
        assert_eq!(episodes, snapshot);
    }

    // ── Serialisation ────────────────────────────────────────────────────────

    #[test]
    fn test_serializes_as_plain_object() {
        let filter = MetaFilter::from_tokens(["location_name=siteA", "hsr_id=7"]);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"hsr_id": "7", "location_name": "siteA"})
        );
        assert_eq!(serde_json::to_value(MetaFilter::new()).unwrap(), json!({}));
    }
}
