//! Correct-score probability estimation.
//!
//! [`ScoreModel`] is the extension point; [`PoissonScoreModel`] is the
//! default and treats home and away goals as independent Poisson variables.

use std::collections::BTreeMap;

use serde::Serialize;

/// Largest goal count reported with its own `"h-a"` key.
const LISTED_MAX: u32 = 3;

/// What a score model sees of a match.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInput {
    pub xg_home: Option<f64>,
    pub xg_away: Option<f64>,
}

/// Score distribution in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScorePrediction {
    /// `"h-a"` for both sides in 0..=3, plus `"other"` for the remainder.
    pub score_probabilities: BTreeMap<String, f64>,
    pub both_teams_score: f64,
    pub over_2_5: f64,
    pub under_2_5: f64,
    pub most_likely_score: String,
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

pub trait ScoreModel {
    fn predict(&self, input: &ScoreInput) -> ScorePrediction;
}

/// Independent Poisson goals with rates from match xG.
///
/// Missing or non-positive xG falls back to league-average scoring rates.
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonScoreModel {
    pub home_rate: f64,
    pub away_rate: f64,
    pub max_goals: u32,
}

impl Default for PoissonScoreModel {
    fn default() -> Self {
        Self {
            home_rate: 1.45,
            away_rate: 1.15,
            max_goals: 10,
        }
    }
}

impl PoissonScoreModel {
    pub fn new(home_rate: f64, away_rate: f64, max_goals: u32) -> Self {
        Self {
            home_rate,
            away_rate,
            max_goals: max_goals.max(LISTED_MAX),
        }
    }

    fn rate(xg: Option<f64>, fallback: f64) -> f64 {
        match xg {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => fallback,
        }
    }
}

impl ScoreModel for PoissonScoreModel {
    fn predict(&self, input: &ScoreInput) -> ScorePrediction {
        let max_goals = self.max_goals.max(LISTED_MAX);
        let pmf_home = poisson_pmf(Self::rate(input.xg_home, self.home_rate), max_goals);
        let pmf_away = poisson_pmf(Self::rate(input.xg_away, self.away_rate), max_goals);

        let mut prediction = ScorePrediction::default();
        let mut listed = 0.0;
        let mut best = (f64::MIN, 0usize, 0usize);

        for (h, p_h) in pmf_home.iter().enumerate() {
            for (a, p_a) in pmf_away.iter().enumerate() {
                let p = p_h * p_a;

                if p > best.0 {
                    best = (p, h, a);
                }
                if h as u32 <= LISTED_MAX && a as u32 <= LISTED_MAX {
                    prediction
                        .score_probabilities
                        .insert(format!("{}-{}", h, a), round2(p * 100.0));
                    listed += p;
                }
                if h > 0 && a > 0 {
                    prediction.both_teams_score += p;
                }
                if h + a > 2 {
                    prediction.over_2_5 += p;
                }
                match h.cmp(&a) {
                    std::cmp::Ordering::Greater => prediction.home_win += p,
                    std::cmp::Ordering::Equal => prediction.draw += p,
                    std::cmp::Ordering::Less => prediction.away_win += p,
                }
            }
        }

        prediction
            .score_probabilities
            .insert("other".to_string(), round2((1.0 - listed).max(0.0) * 100.0));
        prediction.most_likely_score = format!("{}-{}", best.1, best.2);
        prediction.under_2_5 = round2((1.0 - prediction.over_2_5) * 100.0);
        prediction.over_2_5 = round2(prediction.over_2_5 * 100.0);
        prediction.both_teams_score = round2(prediction.both_teams_score * 100.0);
        prediction.home_win = round2(prediction.home_win * 100.0);
        prediction.draw = round2(prediction.draw * 100.0);
        prediction.away_win = round2(prediction.away_win * 100.0);
        prediction
    }
}

/// P(X = k) for k in 0..=max_k; the tail mass is folded into `max_k`.
fn poisson_pmf(lambda: f64, max_k: u32) -> Vec<f64> {
    let max_k = max_k as usize;
    let lambda = lambda.max(0.0);
    let mut out = vec![0.0; max_k + 1];

    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }

    let sum: f64 = out.iter().sum();
    if sum < 1.0 {
        out[max_k] += 1.0 - sum;
    }
    out
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pmf_sums_to_one() {
        let pmf = poisson_pmf(1.4, 10);
        let sum: f64 = pmf.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((pmf[0] - (-1.4f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_sums_to_hundred() {
        let model = PoissonScoreModel::default();
        let prediction = model.predict(&ScoreInput {
            xg_home: Some(1.6),
            xg_away: Some(0.9),
        });

        let grid: f64 = prediction.score_probabilities.values().sum();
        assert!((grid - 100.0).abs() < 0.2, "grid sums to {}", grid);

        let outcomes = prediction.home_win + prediction.draw + prediction.away_win;
        assert!((outcomes - 100.0).abs() < 0.05);
        assert!((prediction.over_2_5 + prediction.under_2_5 - 100.0).abs() < 0.05);
        assert_eq!(prediction.score_probabilities.len(), 17);
    }

    #[test]
    fn test_favours_higher_xg() {
        let model = PoissonScoreModel::default();
        let home_heavy = model.predict(&ScoreInput {
            xg_home: Some(2.8),
            xg_away: Some(0.4),
        });
        assert!(home_heavy.home_win > home_heavy.away_win);
        assert!(home_heavy.score_probabilities["2-0"] > home_heavy.score_probabilities["0-2"]);

        let away_heavy = model.predict(&ScoreInput {
            xg_home: Some(0.3),
            xg_away: Some(2.1),
        });
        assert!(away_heavy.away_win > away_heavy.home_win);
        assert_eq!(away_heavy.most_likely_score, "0-2");
    }

    #[test]
    fn test_missing_xg_uses_league_rates() {
        let model = PoissonScoreModel::new(1.45, 1.15, 10);
        let fallback = model.predict(&ScoreInput::default());
        let explicit = model.predict(&ScoreInput {
            xg_home: Some(1.45),
            xg_away: Some(1.15),
        });
        assert_eq!(fallback, explicit);
        assert_eq!(fallback.most_likely_score, "1-1");
    }
}
