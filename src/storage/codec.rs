//! Wire formats for the serialized match columns.
//!
//! - `goal_times`: comma-separated minutes, `"12,45,88"`; empty for none.
//! - `score_probabilities`: JSON object of score → percentage,
//!   `{"1-0": 12.5, "1-1": 11.0}`.

use std::collections::BTreeMap;

pub fn encode_goal_times(minutes: &[u32]) -> String {
    minutes
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode goal minutes, skipping items that are not integers.
pub fn decode_goal_times(raw: &str) -> Vec<u32> {
    raw.split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect()
}

pub fn encode_score_probabilities(probs: &BTreeMap<String, f64>) -> String {
    serde_json::to_string(probs).unwrap_or_else(|_| "{}".to_string())
}

/// Decode a score mapping; empty or malformed input yields an empty map.
pub fn decode_score_probabilities(raw: &str) -> BTreeMap<String, f64> {
    if raw.trim().is_empty() {
        return BTreeMap::new();
    }
    serde_json::from_str(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_times_format() {
        assert_eq!(encode_goal_times(&[12, 45, 88]), "12,45,88");
        assert_eq!(encode_goal_times(&[]), "");
        assert_eq!(decode_goal_times("12,45,88"), vec![12, 45, 88]);
        assert_eq!(decode_goal_times(""), Vec::<u32>::new());
        assert_eq!(decode_goal_times("12, x ,90"), vec![12, 90]);
    }

    #[test]
    fn test_score_probabilities_format() {
        let mut probs = BTreeMap::new();
        probs.insert("1-0".to_string(), 12.5);
        probs.insert("0-0".to_string(), 9.25);

        let raw = encode_score_probabilities(&probs);
        assert_eq!(raw, r#"{"0-0":9.25,"1-0":12.5}"#);
        assert_eq!(decode_score_probabilities(&raw), probs);
    }

    #[test]
    fn test_score_probabilities_malformed() {
        assert!(decode_score_probabilities("").is_empty());
        assert!(decode_score_probabilities("not json").is_empty());
        assert!(decode_score_probabilities("[1,2]").is_empty());
    }
}
