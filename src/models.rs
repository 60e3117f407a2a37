use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Application status, ordered as the pipeline a candidate moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AppStatus {
    Interested,
    Drafting,
    Submitted,
    Rejected,
    Offer,
}

impl AppStatus {
    pub const ALL: [AppStatus; 5] = [
        AppStatus::Interested,
        AppStatus::Drafting,
        AppStatus::Submitted,
        AppStatus::Rejected,
        AppStatus::Offer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Interested => "Interested",
            AppStatus::Drafting => "Drafting",
            AppStatus::Submitted => "Submitted",
            AppStatus::Rejected => "Rejected",
            AppStatus::Offer => "Offer",
        }
    }

    /// The conventional "move to next" step. Rejected, Offer and Submitted have none.
    pub fn next(&self) -> Option<AppStatus> {
        match self {
            AppStatus::Interested => Some(AppStatus::Drafting),
            AppStatus::Drafting => Some(AppStatus::Submitted),
            _ => None,
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AppStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown status '{}'. Expected one of: interested, drafting, submitted, rejected, offer",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub cv_text: String,
    #[serde(rename = "linkedinUrl", default, with = "empty_as_none")]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl UserProfile {
    /// Appends a keyword, keeping insertion order. Blank and duplicate keywords are ignored.
    pub fn add_interest(&mut self, interest: &str) -> bool {
        let interest = interest.trim();
        if interest.is_empty() || self.interests.iter().any(|i| i == interest) {
            return false;
        }
        self.interests.push(interest.to_string());
        true
    }

    pub fn remove_interest(&mut self, interest: &str) -> bool {
        let before = self.interests.len();
        self.interests.retain(|i| i != interest.trim());
        self.interests.len() != before
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("there")
    }
}

/// Structured fields extracted from a posting. Only lives inside the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAnalysis {
    pub title: String,
    pub company: String,
    pub deadline: Option<NaiveDate>,
    pub scam_risk_score: u8,
    pub scam_reason: Option<String>,
    pub key_criteria: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitResult {
    pub fit_score: u8,
    pub reasoning: String,
}

/// A tracked application candidate. This is the interchange shape read by every
/// presentation adapter, so `url`, `scamReason` may be missing and `deadline` may be null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: AppStatus,
    pub fit_score: u8,
    pub fit_reasoning: String,
    pub scam_risk_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scam_reason: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl Opportunity {
    pub fn is_high_risk(&self) -> bool {
        self.scam_risk_score > 70
    }

    pub fn fit_band(&self) -> FitBand {
        FitBand::from_score(self.fit_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitBand {
    Strong,
    Moderate,
    Weak,
}

impl FitBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => FitBand::Strong,
            50..=79 => FitBand::Moderate,
            _ => FitBand::Weak,
        }
    }
}

// The profile form stores an empty string when no URL was entered.
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Alex Developer".to_string(),
            cv_text: "Rust".to_string(),
            profile_url: None,
            interests: vec!["Remote".to_string()],
        }
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("drafting".parse::<AppStatus>().unwrap(), AppStatus::Drafting);
        assert_eq!(" OFFER ".parse::<AppStatus>().unwrap(), AppStatus::Offer);
        assert!("closed".parse::<AppStatus>().is_err());
        for status in AppStatus::ALL {
            assert_eq!(status.to_string().parse::<AppStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_order_follows_pipeline() {
        let mut shuffled = vec![AppStatus::Offer, AppStatus::Interested, AppStatus::Submitted];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![AppStatus::Interested, AppStatus::Submitted, AppStatus::Offer]
        );
    }

    #[test]
    fn test_status_next() {
        assert_eq!(AppStatus::Interested.next(), Some(AppStatus::Drafting));
        assert_eq!(AppStatus::Drafting.next(), Some(AppStatus::Submitted));
        assert_eq!(AppStatus::Submitted.next(), None);
        assert_eq!(AppStatus::Rejected.next(), None);
        assert_eq!(AppStatus::Offer.next(), None);
    }

    #[test]
    fn test_add_interest_rejects_duplicates_and_blanks() {
        let mut p = profile();
        assert!(p.add_interest(" AI "));
        assert!(!p.add_interest("AI"));
        assert!(!p.add_interest("Remote"));
        assert!(!p.add_interest("   "));
        assert_eq!(p.interests, vec!["Remote", "AI"]);

        assert!(p.remove_interest("Remote"));
        assert!(!p.remove_interest("Remote"));
        assert_eq!(p.interests, vec!["AI"]);
    }

    #[test]
    fn test_first_name() {
        assert_eq!(profile().first_name(), "Alex");
        let mut p = profile();
        p.name = "  ".to_string();
        assert_eq!(p.first_name(), "there");
    }

    #[test]
    fn test_profile_document_shape() {
        let json = r#"{"name":"Sam","cvText":"cv","linkedinUrl":"","interests":["AI"]}"#;
        let p: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.profile_url, None);
        assert_eq!(p.cv_text, "cv");

        let out = serde_json::to_value(&p).unwrap();
        assert_eq!(out["linkedinUrl"], "");
    }

    #[test]
    fn test_opportunity_tolerates_missing_optionals() {
        let json = r#"{
            "id": "2",
            "title": "Data Entry Clerk",
            "company": "Unknown LLC",
            "status": "Interested",
            "fitScore": 20,
            "fitReasoning": "Below level.",
            "scamRiskScore": 95,
            "deadline": null,
            "dateAdded": "2026-10-16T09:00:00Z",
            "notes": "Looks suspicious."
        }"#;
        let opp: Opportunity = serde_json::from_str(json).unwrap();
        assert_eq!(opp.url, None);
        assert_eq!(opp.scam_reason, None);
        assert_eq!(opp.deadline, None);
        assert!(opp.is_high_risk());
        assert_eq!(opp.fit_band(), FitBand::Weak);

        let out = serde_json::to_value(&opp).unwrap();
        assert!(out["deadline"].is_null());
        assert!(out.get("url").is_none());
    }

    #[test]
    fn test_fit_band() {
        assert_eq!(FitBand::from_score(80), FitBand::Strong);
        assert_eq!(FitBand::from_score(50), FitBand::Moderate);
        assert_eq!(FitBand::from_score(49), FitBand::Weak);
    }
}
