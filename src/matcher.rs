use std::sync::Arc;
use tracing::{error, info, warn};

use crate::ai::AIProvider;
use crate::models::{FitResult, JobAnalysis, UserProfile};
use crate::schema::{matching_schema, parse_matching};

pub const NEUTRAL_FIT_SCORE: u8 = 50;
pub const MISSING_KEY_REASONING: &str = "API key missing: fit score not calculated.";
pub const FAILED_FIT_REASONING: &str = "Error calculating fit.";

/// Scores a profile against an analysed posting.
///
/// Never fails: without a credential it returns a neutral score, and on any call or
/// parse failure it returns a zero score, so a bad match never blocks saving.
#[derive(Clone)]
pub struct Matcher {
    provider: Option<Arc<dyn AIProvider>>,
}

impl Matcher {
    pub fn new(provider: Option<Arc<dyn AIProvider>>) -> Self {
        Self { provider }
    }

    pub async fn match_profile(&self, profile: &UserProfile, analysis: &JobAnalysis) -> FitResult {
        let Some(provider) = &self.provider else {
            warn!("no API key, returning neutral fit score");
            return FitResult {
                fit_score: NEUTRAL_FIT_SCORE,
                reasoning: MISSING_KEY_REASONING.to_string(),
            };
        };

        let prompt = matching_prompt(profile, analysis);
        let result = match provider.complete_json(&prompt, &matching_schema()).await {
            Ok(raw) => parse_matching(&raw).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(fit) => {
                info!(fit_score = fit.fit_score, "matched profile to job");
                fit
            }
            Err(reason) => {
                error!(error = %reason, "fit calculation failed");
                FitResult {
                    fit_score: 0,
                    reasoning: FAILED_FIT_REASONING.to_string(),
                }
            }
        }
    }
}

fn matching_prompt(profile: &UserProfile, analysis: &JobAnalysis) -> String {
    format!(
        "Compare the User Profile against the Job Analysis.\n\n\
        User Profile:\n\
        - Experience/CV: {}\n\
        - Interests: {}\n\n\
        Job Analysis:\n\
        - Title: {}\n\
        - Criteria: {}\n\n\
        Determine a fit score (0-100) and provide a concise reasoning (max 1 sentence).",
        profile.cv_text,
        profile.interests.join(", "),
        analysis.title,
        analysis.key_criteria.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedProvider;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Alex Developer".to_string(),
            cv_text: "Analyst with 4 years of SQL".to_string(),
            profile_url: None,
            interests: vec!["Remote".to_string(), "Data".to_string()],
        }
    }

    fn analysis() -> JobAnalysis {
        JobAnalysis {
            title: "Great Role".to_string(),
            company: "Example Co".to_string(),
            deadline: None,
            scam_risk_score: 10,
            scam_reason: None,
            key_criteria: vec!["SQL".to_string(), "3+ yrs".to_string()],
            summary: "Analyst role.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_match_success() {
        let provider = Arc::new(
            ScriptedProvider::new().reply(r#"{"fitScore": 88, "reasoning": "Strong SQL experience."}"#),
        );
        let matcher = Matcher::new(Some(provider.clone()));

        let fit = matcher.match_profile(&profile(), &analysis()).await;
        assert_eq!(fit.fit_score, 88);
        assert_eq!(fit.reasoning, "Strong SQL experience.");

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("Analyst with 4 years of SQL"));
        assert!(prompt.contains("Remote, Data"));
        assert!(prompt.contains("Title: Great Role"));
        assert!(prompt.contains("Criteria: SQL, 3+ yrs"));
    }

    #[tokio::test]
    async fn test_missing_credential_is_neutral() {
        let matcher = Matcher::new(None);
        let fit = matcher.match_profile(&profile(), &analysis()).await;
        assert_eq!(
            fit,
            FitResult {
                fit_score: 50,
                reasoning: MISSING_KEY_REASONING.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_service_failure_degrades_to_zero() {
        let provider = Arc::new(ScriptedProvider::new().fail("HTTP 500"));
        let matcher = Matcher::new(Some(provider));

        let fit = matcher.match_profile(&profile(), &analysis()).await;
        assert_eq!(fit.fit_score, 0);
        assert_eq!(fit.reasoning, FAILED_FIT_REASONING);
    }

    #[tokio::test]
    async fn test_parse_failure_degrades_to_zero() {
        let provider = Arc::new(ScriptedProvider::new().reply(r#"{"fitScore": "very high"}"#));
        let matcher = Matcher::new(Some(provider));

        let fit = matcher.match_profile(&profile(), &analysis()).await;
        assert_eq!(fit.fit_score, 0);
        assert_eq!(fit.reasoning, FAILED_FIT_REASONING);
    }
}
