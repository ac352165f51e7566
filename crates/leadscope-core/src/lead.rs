//! The merged lead profile, its scoring result, and job lifecycle states.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::{
    CompanyProfile, ContactProfile, EngagementProfile, RepositoryProfile, TechnologyProfile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Github,
    Website,
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadSource::Github => f.write_str("github"),
            LeadSource::Website => f.write_str("website"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadMetadata {
    pub analyzed_at: DateTime<Utc>,
    pub source: LeadSource,
    /// Canonical subject URL: the explicit website, or the repository
    /// homepage when the homepage fallback was taken.
    pub url: Option<String>,
}

/// The union of all sub-profiles for one analyzed subject.
///
/// Each sub-profile is `None` when its stage was not applicable or
/// degraded after retries. Built fresh per analysis run and persisted
/// whole; never partially written mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadProfile {
    pub repository: Option<RepositoryProfile>,
    pub technology: Option<TechnologyProfile>,
    pub contact: Option<ContactProfile>,
    pub company: Option<CompanyProfile>,
    #[serde(default)]
    pub engagement: Option<EngagementProfile>,
    pub metadata: LeadMetadata,
    /// Set once by the scoring engine after the merge; `None` only while
    /// the pipeline is still assembling the profile.
    pub scoring: Option<Scoring>,
}

impl LeadProfile {
    /// Display name for listings: company name, then repository name,
    /// then a fixed placeholder.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.company
            .as_ref()
            .and_then(|c| c.name.clone())
            .or_else(|| self.repository.as_ref().map(|r| r.name.clone()))
            .unwrap_or_else(|| "Unknown Lead".to_owned())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Letter grade derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
}

impl Grade {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follow-up priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    High,
    Medium,
    Low,
    VeryLow,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::VeryLow => "very-low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five named sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub github: f64,
    pub technology: f64,
    pub company: f64,
    pub contact: f64,
    pub engagement: f64,
}

/// Deterministic scoring output; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    /// Weighted total in [0, 100], rounded to 2 decimal places.
    pub total_score: f64,
    pub grade: Grade,
    pub priority: Priority,
    pub breakdown: ScoreBreakdown,
    /// Fixed template strings in sub-score evaluation order.
    pub reasoning: Vec<String>,
    /// Evidence confidence in [0, 1], rounded to 2 decimal places.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Lifecycle of an analysis job. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_serializes_to_letter_form() {
        assert_eq!(
            serde_json::to_string(&Grade::APlus).expect("serialize"),
            "\"A+\""
        );
        assert_eq!(
            serde_json::to_string(&Grade::D).expect("serialize"),
            "\"D\""
        );
    }

    #[test]
    fn priority_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Priority::VeryLow).expect("serialize"),
            "\"very-low\""
        );
    }

    #[test]
    fn job_status_round_trips_as_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
        }
        assert!("bogus".parse::<JobStatus>().is_err());
    }

    #[test]
    fn terminal_states_are_completed_and_failed() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }
}
