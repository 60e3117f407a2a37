//! Values used when nothing usable is stored yet.

use chrono::{NaiveDate, Utc};

use crate::models::{AppStatus, Opportunity, UserProfile};

pub fn default_profile() -> UserProfile {
    UserProfile {
        name: "Alex Developer".to_string(),
        cv_text: "Senior Full Stack Engineer with 5 years experience in React, Node.js, and Python. \
                  Passionate about AI integration and scalable systems."
            .to_string(),
        profile_url: None,
        interests: vec!["Remote".to_string(), "AI".to_string(), "Startups".to_string()],
    }
}

pub fn seed_opportunities() -> Vec<Opportunity> {
    let now = Utc::now();
    vec![
        Opportunity {
            id: "1".to_string(),
            title: "Senior Product Manager".to_string(),
            company: "TechCorp Inc.".to_string(),
            url: Some("https://example.com/job".to_string()),
            status: AppStatus::Drafting,
            fit_score: 85,
            fit_reasoning: "Strong match for PM skills, but domain is FinTech which is not in interests."
                .to_string(),
            scam_risk_score: 5,
            scam_reason: None,
            deadline: NaiveDate::from_ymd_opt(2023, 12, 31),
            date_added: now,
            notes: "Referral from Sarah.".to_string(),
            raw_text: None,
        },
        Opportunity {
            id: "2".to_string(),
            title: "Data Entry Clerk ($100/hr)".to_string(),
            company: "Unknown LLC".to_string(),
            url: None,
            status: AppStatus::Interested,
            fit_score: 20,
            fit_reasoning: "Role is below experience level.".to_string(),
            scam_risk_score: 95,
            scam_reason: Some("Unrealistic salary, generic email.".to_string()),
            deadline: None,
            date_added: now,
            notes: "Looks suspicious.".to_string(),
            raw_text: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Tracker;

    #[test]
    fn test_seed_is_a_valid_store() {
        let seeds = seed_opportunities();
        let tracker = Tracker::from_records(seeds.clone());
        assert_eq!(tracker.len(), seeds.len());
        assert!(tracker.get("2").unwrap().is_high_risk());
    }

    #[test]
    fn test_default_profile() {
        let profile = default_profile();
        assert_eq!(profile.first_name(), "Alex");
        assert_eq!(profile.interests, vec!["Remote", "AI", "Startups"]);
    }
}
