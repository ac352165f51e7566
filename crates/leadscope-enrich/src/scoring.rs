//! The lead scoring engine.
//!
//! Pure functions, no I/O: the caller supplies `now`, so scoring the same
//! profile at the same instant is bit-for-bit reproducible. Weights,
//! thresholds, and reasoning templates are part of the observable
//! contract — changing them changes every persisted score.

use chrono::{DateTime, Utc};

use leadscope_core::profile::{
    CompanyProfile, ContactProfile, EngagementProfile, RepositoryProfile, SocialPlatform,
    TechnologyProfile,
};
use leadscope_core::{Grade, LeadProfile, Priority, ScoreBreakdown, Scoring};

const WEIGHT_GITHUB: f64 = 0.25;
const WEIGHT_TECHNOLOGY: f64 = 0.20;
const WEIGHT_COMPANY: f64 = 0.25;
const WEIGHT_CONTACT: f64 = 0.15;
const WEIGHT_ENGAGEMENT: f64 = 0.15;

/// Framework names counting as a modern stack for the technology score.
const MODERN_FRAMEWORKS: &[&str] = &["React", "Vue.js", "Angular", "Next.js", "Node.js"];

/// Scores a merged lead profile.
///
/// The five sub-scores are computed in fixed order (github, technology,
/// company, contact, engagement), weighted into the total, and the
/// reasoning strings follow that same order.
#[must_use]
pub fn score_lead(lead: &LeadProfile, now: DateTime<Utc>) -> Scoring {
    let breakdown = ScoreBreakdown {
        github: score_github(lead.repository.as_ref(), now),
        technology: score_technology(lead.technology.as_ref()),
        company: score_company(lead.company.as_ref(), now),
        contact: score_contact(lead.contact.as_ref()),
        engagement: score_engagement(lead.engagement.as_ref(), now),
    };

    let total = breakdown.github * WEIGHT_GITHUB
        + breakdown.technology * WEIGHT_TECHNOLOGY
        + breakdown.company * WEIGHT_COMPANY
        + breakdown.contact * WEIGHT_CONTACT
        + breakdown.engagement * WEIGHT_ENGAGEMENT;
    let total_score = round2(total);

    Scoring {
        total_score,
        grade: grade_for(total_score),
        priority: priority_for(total_score, &breakdown),
        breakdown,
        reasoning: reasoning_for(&breakdown, lead),
        confidence: confidence_for(lead),
    }
}

fn score_github(repository: Option<&RepositoryProfile>, now: DateTime<Utc>) -> f64 {
    let Some(repo) = repository else {
        return 0.0;
    };

    let mut score = repo.analysis.activity_score * 30.0 + repo.analysis.popularity_score * 30.0;

    if repo.stars > 0 {
        #[allow(clippy::cast_precision_loss)]
        let star_points = (repo.stars as f64 / 100.0) * 20.0;
        score += star_points.min(20.0);
    }

    if !repo.contributors.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        let contributor_points = repo.contributors.len() as f64 * 2.0;
        score += contributor_points.min(10.0);
    }

    if let Some(pushed) = repo.pushed_at {
        if (now - pushed).num_days() < 30 {
            score += 10.0;
        }
    }

    score.min(100.0)
}

fn score_technology(technology: Option<&TechnologyProfile>) -> f64 {
    let Some(tech) = technology else {
        return 0.0;
    };

    let mut score: f64 = 0.0;
    let stack = &tech.technologies;

    let has_modern = stack
        .frontend
        .iter()
        .chain(stack.backend.iter())
        .any(|d| MODERN_FRAMEWORKS.contains(&d.name.as_str()));
    if has_modern {
        score += 30.0;
    }

    if !stack.analytics.is_empty() {
        score += 20.0;
    }
    if !stack.ecommerce.is_empty() {
        score += 25.0;
    }
    if !stack.marketing.is_empty() {
        score += 15.0;
    }
    if !stack.security.is_empty() {
        score += 10.0;
    }

    score.min(100.0)
}

fn score_company(company: Option<&CompanyProfile>, now: DateTime<Utc>) -> f64 {
    let Some(company) = company else {
        return 0.0;
    };

    let mut score: f64 = 0.0;

    if company.public_repos.is_some_and(|repos| repos > 10) {
        score += 20.0;
    }
    if company.followers.is_some_and(|followers| followers > 100) {
        score += 20.0;
    }
    if company.email.is_some() {
        score += 15.0;
    }
    if company.website.is_some() {
        score += 15.0;
    }
    if company.location.is_some() {
        score += 10.0;
    }
    if let Some(created) = company.created_at {
        #[allow(clippy::cast_precision_loss)]
        let years_old = (now - created).num_days() as f64 / 365.0;
        if years_old > 2.0 {
            score += 20.0;
        }
    }

    score.min(100.0)
}

fn score_contact(contact: Option<&ContactProfile>) -> f64 {
    let Some(contact) = contact else {
        return 0.0;
    };

    let mut score = 0.0;

    if !contact.emails.is_empty() {
        score += 40.0;
        if contact.emails.len() > 2 {
            score += 10.0;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let platform_points = contact.social.len() as f64 * 10.0;
    score += platform_points.min(30.0);

    if contact.social.contains_key(&SocialPlatform::Linkedin) {
        score += 20.0;
    }

    score.min(100.0)
}

fn score_engagement(engagement: Option<&EngagementProfile>, now: DateTime<Utc>) -> f64 {
    // Neutral baseline when nothing is known.
    let Some(engagement) = engagement else {
        return 50.0;
    };

    let mut score = 50.0;

    if let Some(last_update) = engagement.last_update {
        let days = (now - last_update).num_days();
        if days < 7 {
            score += 30.0;
        } else if days < 30 {
            score += 20.0;
        } else if days < 90 {
            score += 10.0;
        }
    }

    if let Some(social_activity) = engagement.social_activity {
        score += (social_activity * 5.0).min(20.0);
    }

    score.min(100.0)
}

fn grade_for(total: f64) -> Grade {
    if total >= 90.0 {
        Grade::APlus
    } else if total >= 80.0 {
        Grade::A
    } else if total >= 70.0 {
        Grade::BPlus
    } else if total >= 60.0 {
        Grade::B
    } else if total >= 50.0 {
        Grade::CPlus
    } else if total >= 40.0 {
        Grade::C
    } else {
        Grade::D
    }
}

fn priority_for(total: f64, breakdown: &ScoreBreakdown) -> Priority {
    if total >= 70.0 {
        return Priority::High;
    }

    let has_strong_area = [
        breakdown.github,
        breakdown.technology,
        breakdown.company,
        breakdown.contact,
        breakdown.engagement,
    ]
    .iter()
    .any(|score| *score >= 80.0);
    if has_strong_area && total >= 50.0 {
        return Priority::High;
    }

    if total >= 50.0 {
        Priority::Medium
    } else if total >= 30.0 {
        Priority::Low
    } else {
        Priority::VeryLow
    }
}

/// Fixed reasoning templates, appended in sub-score evaluation order with
/// the technology/company-specific extras directly after their sub-score.
fn reasoning_for(breakdown: &ScoreBreakdown, lead: &LeadProfile) -> Vec<String> {
    let mut reasons = Vec::new();

    if breakdown.github >= 70.0 {
        reasons.push("Strong GitHub presence with active development".to_owned());
    } else if breakdown.github < 30.0 {
        reasons.push("Limited GitHub activity or visibility".to_owned());
    }

    if breakdown.technology >= 70.0 {
        reasons.push("Modern technology stack indicates technical sophistication".to_owned());
    }
    if lead
        .technology
        .as_ref()
        .is_some_and(|t| !t.technologies.ecommerce.is_empty())
    {
        reasons.push("E-commerce platform suggests revenue potential".to_owned());
    }

    if breakdown.company >= 70.0 {
        reasons.push("Well-established company with strong online presence".to_owned());
    }
    if lead.company.as_ref().is_some_and(|c| c.email.is_some()) {
        reasons.push("Direct contact information available".to_owned());
    }

    if breakdown.contact >= 60.0 {
        reasons.push("Multiple contact channels available".to_owned());
    } else if breakdown.contact < 30.0 {
        reasons.push("Limited contact information found".to_owned());
    }

    if breakdown.engagement >= 70.0 {
        reasons.push("Recent activity indicates active business".to_owned());
    }

    if reasons.is_empty() {
        reasons.push("Moderate potential - requires further research".to_owned());
    }

    reasons
}

/// Mean of fixed per-present-source weights; 0.5 when no source is present.
fn confidence_for(lead: &LeadProfile) -> f64 {
    let mut total = 0.0;
    let mut factors = 0u32;

    if lead.repository.is_some() {
        total += 0.9;
        factors += 1;
    }
    if let Some(tech) = &lead.technology {
        if tech.confidence > 0.0 {
            total += tech.confidence;
            factors += 1;
        }
    }
    if lead.company.is_some() {
        total += 0.85;
        factors += 1;
    }
    if lead.contact.as_ref().is_some_and(|c| !c.emails.is_empty()) {
        total += 0.95;
        factors += 1;
    }

    if factors == 0 {
        return 0.5;
    }
    round2(total / f64::from(factors))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Batch helpers
// ---------------------------------------------------------------------------

/// Leads partitioned at the fixed totals: hot ≥ 70 > warm ≥ 50 > cold.
#[derive(Debug, Default)]
pub struct Categorized {
    pub hot: Vec<LeadProfile>,
    pub warm: Vec<LeadProfile>,
    pub cold: Vec<LeadProfile>,
}

/// Scores each lead and partitions it by total score.
#[must_use]
pub fn categorize(leads: Vec<LeadProfile>, now: DateTime<Utc>) -> Categorized {
    let mut out = Categorized::default();

    for mut lead in leads {
        let scoring = score_lead(&lead, now);
        let total = scoring.total_score;
        lead.scoring = Some(scoring);

        if total >= 70.0 {
            out.hot.push(lead);
        } else if total >= 50.0 {
            out.warm.push(lead);
        } else {
            out.cold.push(lead);
        }
    }

    out
}

/// Scores each lead and keeps only those at or above `min_score`.
#[must_use]
pub fn filter_by_min_score(
    leads: Vec<LeadProfile>,
    min_score: f64,
    now: DateTime<Utc>,
) -> Vec<LeadProfile> {
    leads
        .into_iter()
        .filter_map(|mut lead| {
            let scoring = score_lead(&lead, now);
            if scoring.total_score >= min_score {
                lead.scoring = Some(scoring);
                Some(lead)
            } else {
                None
            }
        })
        .collect()
}

/// Scores each lead and sorts them by total score, highest first.
#[must_use]
pub fn prioritize(leads: Vec<LeadProfile>, now: DateTime<Utc>) -> Vec<LeadProfile> {
    let mut scored: Vec<LeadProfile> = leads
        .into_iter()
        .map(|mut lead| {
            lead.scoring = Some(score_lead(&lead, now));
            lead
        })
        .collect();

    scored.sort_by(|a, b| {
        let a_total = a.scoring.as_ref().map_or(0.0, |s| s.total_score);
        let b_total = b.scoring.as_ref().map_or(0.0, |s| s.total_score);
        b_total.total_cmp(&a_total)
    });

    scored
}
