use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{error, info};

use crate::ai::AIProvider;
use crate::config::missing_credential;
use crate::error::PipelineError;
use crate::models::JobAnalysis;
use crate::schema::{analysis_schema, parse_analysis};

/// Turns raw posting text into a [`JobAnalysis`]. Any failure aborts the submission.
#[derive(Clone)]
pub struct Extractor {
    provider: Option<Arc<dyn AIProvider>>,
}

impl Extractor {
    pub fn new(provider: Option<Arc<dyn AIProvider>>) -> Self {
        Self { provider }
    }

    pub async fn analyze(&self, raw_text: &str) -> Result<JobAnalysis, PipelineError> {
        self.analyze_on(raw_text, Local::now().date_naive()).await
    }

    /// Like [`Extractor::analyze`] with an explicit "today" for relative deadlines.
    pub async fn analyze_on(
        &self,
        raw_text: &str,
        today: NaiveDate,
    ) -> Result<JobAnalysis, PipelineError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            error!("extraction requested without an API key");
            missing_credential()
        })?;

        let prompt = analysis_prompt(raw_text, today);
        let raw = provider.complete_json(&prompt, &analysis_schema()).await?;

        let analysis = parse_analysis(&raw).map_err(|e| {
            error!(error = %e, "extraction response violated the analysis contract");
            PipelineError::external_with("Could not parse analysis response", e)
        })?;

        info!(
            title = %analysis.title,
            company = %analysis.company,
            scam_risk = analysis.scam_risk_score,
            "extracted job analysis"
        );
        Ok(analysis)
    }
}

fn analysis_prompt(raw_text: &str, today: NaiveDate) -> String {
    format!(
        "You are an expert recruitment vetting agent.\n\
        Analyze the following job description text or message.\n\
        Today is {}. Resolve relative deadlines (\"closes in two weeks\") to YYYY-MM-DD.\n\n\
        Extract the key details.\n\
        Assess for scam markers (poor grammar, asking for money, unrealistic salary, generic gmail address).\n\n\
        Job Text:\n\"{}\"",
        today.format("%Y-%m-%d"),
        raw_text
    )
}
