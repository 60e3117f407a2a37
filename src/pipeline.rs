use std::sync::Arc;
use tracing::{info, instrument};

use crate::ai::AIProvider;
use crate::assemble::assemble;
use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::matcher::Matcher;
use crate::models::{Opportunity, UserProfile};

/// Extraction → Matching → Assembly for one submitted text.
///
/// The two stages run strictly in sequence; they are the only await points.
/// Extraction failures abort the run, matching failures never do.
#[derive(Clone)]
pub struct Pipeline {
    extractor: Extractor,
    matcher: Matcher,
}

impl Pipeline {
    pub fn new(provider: Option<Arc<dyn AIProvider>>) -> Self {
        Self {
            extractor: Extractor::new(provider.clone()),
            matcher: Matcher::new(provider),
        }
    }

    pub fn from_parts(extractor: Extractor, matcher: Matcher) -> Self {
        Self { extractor, matcher }
    }

    #[instrument(skip_all, fields(text_len = raw_text.len()))]
    pub async fn run(
        &self,
        profile: &UserProfile,
        raw_text: &str,
    ) -> Result<Opportunity, PipelineError> {
        let analysis = self.extractor.analyze(raw_text).await?;
        let fit = self.matcher.match_profile(profile, &analysis).await;
        let opportunity = assemble(analysis, fit, raw_text);
        info!(
            opportunity_id = %opportunity.id,
            fit_score = opportunity.fit_score,
            "assembled opportunity"
        );
        Ok(opportunity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedProvider;
    use crate::models::AppStatus;
    use crate::seed::default_profile;

    const ANALYSIS: &str = r#"{
        "title": "Great Role",
        "company": "Example Co",
        "scamRiskScore": 10,
        "keyCriteria": ["SQL", "3+ yrs"],
        "summary": "Own the analytics stack for a small product team."
    }"#;

    #[tokio::test]
    async fn test_run_end_to_end() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .reply(ANALYSIS)
                .reply(r#"{"fitScore": 64, "reasoning": "Good SQL, light on Python."}"#),
        );
        let pipeline = Pipeline::new(Some(provider.clone()));

        let opp = pipeline
            .run(&default_profile(), "Apply now: https://jobs.example.com/42 great role")
            .await
            .unwrap();

        assert_eq!(opp.url.as_deref(), Some("https://jobs.example.com/42"));
        assert_eq!(opp.status, AppStatus::Interested);
        assert_eq!(opp.title, "Great Role");
        assert_eq!(opp.fit_score, 64);
        assert_eq!(opp.fit_reasoning, "Good SQL, light on Python.");
        assert!(opp.notes.contains("Own the analytics stack for a small product team."));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_matching() {
        let provider = Arc::new(ScriptedProvider::new().fail("boom"));
        let pipeline = Pipeline::new(Some(provider.clone()));

        let err = pipeline.run(&default_profile(), "text").await.unwrap_err();
        assert!(matches!(err, PipelineError::ExternalService { .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_matching_failure_still_assembles() {
        let provider = Arc::new(ScriptedProvider::new().reply(ANALYSIS).fail("rate limited"));
        let pipeline = Pipeline::new(Some(provider));

        let opp = pipeline.run(&default_profile(), "text").await.unwrap();
        assert_eq!(opp.fit_score, 0);
        assert_eq!(opp.fit_reasoning, crate::matcher::FAILED_FIT_REASONING);
    }

    #[tokio::test]
    async fn test_without_credential_nothing_is_created() {
        let pipeline = Pipeline::new(None);
        let err = pipeline.run(&default_profile(), "text").await.unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_neutral_match_when_matcher_has_no_credential() {
        let provider = Arc::new(ScriptedProvider::new().reply(ANALYSIS));
        let pipeline = Pipeline::from_parts(Extractor::new(Some(provider.clone())), Matcher::new(None));

        let opp = pipeline.run(&default_profile(), "text").await.unwrap();
        assert_eq!(opp.fit_score, crate::matcher::NEUTRAL_FIT_SCORE);
        assert_eq!(provider.calls(), 1);
    }
}
