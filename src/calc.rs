use serde::{Deserialize, Serialize};

use crate::model::{SectionState, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Fixed tiers out of a 200-point max: high >= 160, medium >= 120.
pub fn priority_for(total: i64) -> Priority {
    if total >= 160 {
        Priority::High
    } else if total >= 120 {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStudent {
    pub name: String,
    pub quiz: i64,
    pub lab: i64,
    pub total: i64,
    pub priority: Priority,
}

/// Ranks every member of the section by the given week's total, descending.
/// Members without an entry that week score zero. The sort is stable, so
/// equal totals keep first-seen roster order; that stability is the only
/// tie-break. Pure: committing the result back is a separate store call.
pub fn compute_ranking(section: &SectionState, week: usize) -> Vec<RankedStudent> {
    let mut ranked: Vec<RankedStudent> = section
        .members()
        .iter()
        .map(|name| {
            let (quiz, lab) = section
                .entry(week, name)
                .map(|e| (e.quiz, e.lab))
                .unwrap_or((0, 0));
            let total = quiz + lab;
            RankedStudent {
                name: name.clone(),
                quiz,
                lab,
                total,
                priority: priority_for(total),
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total));
    ranked
}

/// 1-based position of one trainee when members are ordered by their
/// all-weeks total sum, descending. `None` for a name outside the section.
pub fn overall_rank(section: &SectionState, name: &str) -> Option<usize> {
    if !section.members().iter().any(|m| m == name) {
        return None;
    }
    let mut totals: Vec<(&String, i64)> = section
        .members()
        .iter()
        .map(|m| {
            let sum = (0..section.week_count())
                .filter_map(|w| section.entry(w, m))
                .map(|e| e.total())
                .sum();
            (m, sum)
        })
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals.iter().position(|(m, _)| *m == name).map(|i| i + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineMode {
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "AND")]
    And,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreUnit {
    /// Raw quiz+lab sums, 0..=200.
    #[serde(rename = "sum0to200")]
    Sum0To200,
    /// Halved sums, 0..=100; the threshold reads as a passing score.
    #[serde(rename = "avg0to100")]
    Avg0To100,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendOptions {
    pub window: usize,
    pub threshold: f64,
    pub combine_mode: CombineMode,
    pub score_unit: ScoreUnit,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            window: 3,
            threshold: 60.0,
            combine_mode: CombineMode::And,
            score_unit: ScoreUnit::Avg0To100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Decreasing,
    Low,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedStudent {
    pub name: String,
    pub section: String,
    pub average_score: f64,
    pub trend: Trend,
    pub last_score: f64,
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Scans each trainee's score history for sustained underperformance or a
/// decreasing run. Weeks without an entry are absent from the series, not
/// zero. A trainee with fewer than `window` data points is never flagged.
/// The recent-window mean is compared against the threshold and combined
/// with the monotone non-increasing check per `combine_mode`; `last_score`
/// is the final point of the full series, in the same unit.
pub fn analyze_support(
    store: &Store,
    section: Option<&str>,
    opts: &TrendOptions,
) -> Vec<FlaggedStudent> {
    let window = opts.window.max(1);
    let mut flagged = Vec::new();

    for sec in store.sections() {
        if section.is_some_and(|s| s != sec.name()) {
            continue;
        }
        for name in sec.members() {
            let series: Vec<f64> = (0..sec.week_count())
                .filter_map(|w| sec.entry(w, name))
                .map(|e| match opts.score_unit {
                    ScoreUnit::Sum0To200 => e.total() as f64,
                    ScoreUnit::Avg0To100 => e.total() as f64 / 2.0,
                })
                .collect();
            if series.len() < window {
                continue;
            }

            let recent = &series[series.len() - window..];
            let average = recent.iter().sum::<f64>() / recent.len() as f64;
            let is_decreasing = recent.windows(2).all(|p| p[1] <= p[0]);
            let is_low = average < opts.threshold;
            let hit = match opts.combine_mode {
                CombineMode::Or => is_low || is_decreasing,
                CombineMode::And => is_low && is_decreasing,
            };
            if !hit {
                continue;
            }

            flagged.push(FlaggedStudent {
                name: name.clone(),
                section: sec.name().to_string(),
                average_score: round2(average),
                trend: if is_decreasing {
                    Trend::Decreasing
                } else {
                    Trend::Low
                },
                last_score: round2(series.last().copied().unwrap_or(0.0)),
            });
        }
    }

    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, Store, DEFAULT_SECTION};

    fn seed(store: &mut Store, name: &str, week: usize, quiz: i64, lab: i64) {
        store.upsert(&Record {
            section: None,
            name: name.to_string(),
            week,
            quiz,
            lab,
        });
    }

    /// Seeds one week so the summed total is `total`.
    fn seed_total(store: &mut Store, name: &str, week: usize, total: i64) {
        seed(store, name, week, total / 2, total - total / 2);
    }

    #[test]
    fn ranking_is_descending_with_stable_ties() {
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 150);
        seed_total(&mut store, "B", 0, 200);
        seed_total(&mut store, "C", 0, 150);

        let sec = store.section(DEFAULT_SECTION).expect("section");
        let ranked = compute_ranking(sec, 0);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn ranking_scores_missing_entries_as_zero() {
        let mut store = Store::new();
        seed(&mut store, "A", 0, 10, 10);
        seed(&mut store, "B", 1, 90, 90);

        let sec = store.section(DEFAULT_SECTION).expect("section");
        let ranked = compute_ranking(sec, 0);
        assert_eq!(ranked[0].name, "A");
        assert_eq!(ranked[1].name, "B");
        assert_eq!(ranked[1].total, 0);
        assert_eq!(ranked[1].priority, Priority::Low);
    }

    #[test]
    fn priority_thresholds_sit_at_160_and_120() {
        assert_eq!(priority_for(160), Priority::High);
        assert_eq!(priority_for(159), Priority::Medium);
        assert_eq!(priority_for(120), Priority::Medium);
        assert_eq!(priority_for(119), Priority::Low);
    }

    #[test]
    fn decreasing_run_above_threshold_flags_only_under_or() {
        // Normalized scores 70, 65, 60: mean 65 is not low, but the run is
        // monotone non-increasing.
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 140);
        seed_total(&mut store, "A", 1, 130);
        seed_total(&mut store, "A", 2, 120);

        let or = TrendOptions {
            combine_mode: CombineMode::Or,
            ..TrendOptions::default()
        };
        let flagged = analyze_support(&store, None, &or);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].trend, Trend::Decreasing);
        assert_eq!(flagged[0].average_score, 65.0);
        assert_eq!(flagged[0].last_score, 60.0);

        let and = TrendOptions::default();
        assert!(analyze_support(&store, None, &and).is_empty());
    }

    #[test]
    fn low_average_without_decrease_labels_low_under_or() {
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 80);
        seed_total(&mut store, "A", 1, 100);
        seed_total(&mut store, "A", 2, 90);

        let or = TrendOptions {
            combine_mode: CombineMode::Or,
            ..TrendOptions::default()
        };
        let flagged = analyze_support(&store, None, &or);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].trend, Trend::Low);
        assert_eq!(flagged[0].average_score, 45.0);
    }

    #[test]
    fn low_and_decreasing_flags_under_and() {
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 110);
        seed_total(&mut store, "A", 1, 100);
        seed_total(&mut store, "A", 2, 90);

        let flagged = analyze_support(&store, None, &TrendOptions::default());
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].trend, Trend::Decreasing);
        assert_eq!(flagged[0].average_score, 50.0);
        assert_eq!(flagged[0].last_score, 45.0);
    }

    #[test]
    fn too_few_data_points_never_flag() {
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 10);
        seed_total(&mut store, "A", 1, 5);

        assert!(analyze_support(&store, None, &TrendOptions::default()).is_empty());

        // Absent weeks are filtered out, not treated as zero: entries on
        // weeks 0 and 4 are still only two data points.
        let mut sparse = Store::new();
        seed_total(&mut sparse, "B", 0, 10);
        seed_total(&mut sparse, "B", 4, 5);
        seed_total(&mut sparse, "Pad", 4, 200);
        assert!(analyze_support(&sparse, None, &TrendOptions::default())
            .iter()
            .all(|f| f.name != "B"));
    }

    #[test]
    fn window_and_unit_are_configurable() {
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 100);
        seed_total(&mut store, "A", 1, 90);

        // Window 2, raw sums: mean 95 is not below 60, so AND cannot fire...
        let sum_opts = TrendOptions {
            window: 2,
            score_unit: ScoreUnit::Sum0To200,
            ..TrendOptions::default()
        };
        assert!(analyze_support(&store, None, &sum_opts).is_empty());

        // ...while halved scores (50, 45) sit below the passing threshold.
        let avg_opts = TrendOptions {
            window: 2,
            ..TrendOptions::default()
        };
        let flagged = analyze_support(&store, None, &avg_opts);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].average_score, 47.5);
    }

    #[test]
    fn last_score_comes_from_the_full_series() {
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 40);
        seed_total(&mut store, "A", 1, 100);
        seed_total(&mut store, "A", 2, 90);
        seed_total(&mut store, "A", 3, 80);
        seed_total(&mut store, "A", 4, 70);

        let opts = TrendOptions {
            combine_mode: CombineMode::Or,
            ..TrendOptions::default()
        };
        let flagged = analyze_support(&store, None, &opts);
        assert_eq!(flagged.len(), 1);
        // Recent window is weeks 2..=4; lastScore is week 4 regardless.
        assert_eq!(flagged[0].average_score, 40.0);
        assert_eq!(flagged[0].last_score, 35.0);
    }

    #[test]
    fn section_filter_limits_the_scan() {
        let mut store = Store::new();
        for w in 0..3 {
            store.upsert(&Record {
                section: Some("Foundation".to_string()),
                name: "A".to_string(),
                week: w,
                quiz: 10,
                lab: 10,
            });
            store.upsert(&Record {
                section: Some("Advanced".to_string()),
                name: "B".to_string(),
                week: w,
                quiz: 10,
                lab: 10,
            });
        }

        let opts = TrendOptions {
            combine_mode: CombineMode::Or,
            ..TrendOptions::default()
        };
        let all = analyze_support(&store, None, &opts);
        assert_eq!(all.len(), 2);
        let only = analyze_support(&store, Some("Advanced"), &opts);
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].name, "B");
        assert_eq!(only[0].section, "Advanced");
    }

    #[test]
    fn overall_rank_sums_across_all_weeks() {
        let mut store = Store::new();
        seed_total(&mut store, "A", 0, 100);
        seed_total(&mut store, "A", 1, 100);
        seed_total(&mut store, "B", 0, 150);
        seed_total(&mut store, "C", 1, 150);

        let sec = store.section(DEFAULT_SECTION).expect("section");
        assert_eq!(overall_rank(sec, "A"), Some(1));
        assert_eq!(overall_rank(sec, "B"), Some(2));
        assert_eq!(overall_rank(sec, "C"), Some(3));
        assert_eq!(overall_rank(sec, "Nobody"), None);
    }
}
