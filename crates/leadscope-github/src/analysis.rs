//! Derived repository signals: activity, popularity, and insight strings.
//!
//! All functions are pure; the caller supplies `now` so results are
//! reproducible in tests.

use chrono::{DateTime, Utc};

use leadscope_core::profile::{Contributor, RepoAnalysis};

/// Push-recency score, stepped: <7d → 1.0, <30d → 0.8, <90d → 0.6,
/// <180d → 0.4, else 0.2. A repository with no recorded push scores 0.2.
#[must_use]
pub fn activity_score(pushed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(pushed) = pushed_at else {
        return 0.2;
    };
    let days = (now - pushed).num_days();
    if days < 7 {
        1.0
    } else if days < 30 {
        0.8
    } else if days < 90 {
        0.6
    } else if days < 180 {
        0.4
    } else {
        0.2
    }
}

/// Stars/forks/watchers blend: `stars/1000*0.5 + forks/100*0.3 +
/// watchers/500*0.2`, clamped to 1.0.
#[must_use]
pub fn popularity_score(stars: i64, forks: i64, watchers: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let raw = (stars as f64 / 1000.0) * 0.5
        + (forks as f64 / 100.0) * 0.3
        + (watchers as f64 / 500.0) * 0.2;
    raw.min(1.0)
}

/// Fixed-rule insight strings, in evaluation order.
#[must_use]
pub fn insights(
    activity: f64,
    popularity: f64,
    open_issues: i64,
    homepage: Option<&str>,
    license: Option<&str>,
) -> Vec<String> {
    let mut out = Vec::new();

    if activity > 0.8 {
        out.push("Very active development - recently updated".to_owned());
    } else if activity < 0.3 {
        out.push("Low activity - may be archived or completed".to_owned());
    }

    if popularity > 0.7 {
        out.push("High popularity - strong community interest".to_owned());
    }

    if open_issues > 50 {
        out.push("Many open issues - active user engagement".to_owned());
    }

    if homepage.is_some_and(|h| !h.is_empty()) {
        out.push("Has production website - commercially viable".to_owned());
    }

    if let Some(license) = license {
        out.push(format!("Licensed under {license}"));
    }

    out
}

/// Assembles the full derived analysis for a repository.
#[must_use]
pub fn analyze(
    pushed_at: Option<DateTime<Utc>>,
    stars: i64,
    forks: i64,
    watchers: i64,
    open_issues: i64,
    homepage: Option<&str>,
    license: Option<&str>,
    languages: &[String],
    contributors: &[Contributor],
    now: DateTime<Utc>,
) -> RepoAnalysis {
    let activity = activity_score(pushed_at, now);
    let popularity = popularity_score(stars, forks, watchers);

    RepoAnalysis {
        activity_score: activity,
        popularity_score: popularity,
        tech_stack: languages.to_vec(),
        is_active: activity > 0.5,
        is_popular: popularity > 0.6,
        team_size: contributors.len(),
        insights: insights(activity, popularity, open_issues, homepage, license),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-08-01T00:00:00Z".parse().expect("valid timestamp")
    }

    #[test]
    fn activity_steps_down_with_staleness() {
        let now = now();
        let cases = [
            (1, 1.0),
            (6, 1.0),
            (7, 0.8),
            (29, 0.8),
            (30, 0.6),
            (89, 0.6),
            (90, 0.4),
            (179, 0.4),
            (180, 0.2),
            (400, 0.2),
        ];
        for (days, expected) in cases {
            let pushed = now - Duration::days(days);
            assert!(
                (activity_score(Some(pushed), now) - expected).abs() < f64::EPSILON,
                "{days} days ago should score {expected}"
            );
        }
    }

    #[test]
    fn missing_push_date_scores_minimum_activity() {
        assert!((activity_score(None, now()) - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn popularity_blends_and_clamps() {
        assert!((popularity_score(0, 0, 0)).abs() < f64::EPSILON);
        // 500 stars = 0.25, 50 forks = 0.15, 250 watchers = 0.1
        assert!((popularity_score(500, 50, 250) - 0.5).abs() < 1e-9);
        assert!((popularity_score(100_000, 10_000, 50_000) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn insights_fire_in_fixed_order() {
        let out = insights(1.0, 0.9, 60, Some("https://example.com"), Some("MIT License"));
        assert_eq!(
            out,
            vec![
                "Very active development - recently updated",
                "High popularity - strong community interest",
                "Many open issues - active user engagement",
                "Has production website - commercially viable",
                "Licensed under MIT License",
            ]
        );
    }

    #[test]
    fn low_activity_insight_replaces_active_one() {
        let out = insights(0.2, 0.0, 0, None, None);
        assert_eq!(out, vec!["Low activity - may be archived or completed"]);
    }

    #[test]
    fn moderate_activity_produces_no_activity_insight() {
        let out = insights(0.6, 0.0, 0, None, None);
        assert!(out.is_empty());
    }

    #[test]
    fn empty_homepage_does_not_count_as_website() {
        let out = insights(0.6, 0.0, 0, Some(""), None);
        assert!(out.is_empty());
    }
}
