//! Output contracts for the extraction and matching calls.
//!
//! The provider is asked to answer in JSON conforming to [`analysis_schema`] or
//! [`matching_schema`]. Whatever comes back is validated here before anything
//! else in the pipeline sees it: required fields must be present with the
//! right type, optional fields are defaulted individually, and scores are
//! clamped into `0..=100`.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::SchemaError;
use crate::models::{FitResult, JobAnalysis};

const ANALYSIS: &str = "analysis";
const MATCHING: &str = "matching";

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING", "description": "Job title" },
            "company": { "type": "STRING", "description": "Company name" },
            "deadline": {
                "type": "STRING",
                "nullable": true,
                "description": "Application deadline in YYYY-MM-DD format. If unknown, return null."
            },
            "scamRiskScore": {
                "type": "INTEGER",
                "description": "0-100 probability of being a scam or low quality listing."
            },
            "scamReason": { "type": "STRING", "description": "Reason for the scam risk score." },
            "keyCriteria": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of top 3-5 hard requirements."
            },
            "summary": { "type": "STRING", "description": "Brief 2 sentence summary of the role." }
        },
        "required": ["title", "company", "scamRiskScore", "keyCriteria", "summary"]
    })
}

pub fn matching_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "fitScore": {
                "type": "INTEGER",
                "description": "0-100 score of how well the user fits the job."
            },
            "reasoning": { "type": "STRING", "description": "Short explanation of the fit score." }
        },
        "required": ["fitScore", "reasoning"]
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisPayload {
    title: String,
    company: String,
    #[serde(default)]
    deadline: Option<String>,
    scam_risk_score: i64,
    #[serde(default)]
    scam_reason: Option<String>,
    key_criteria: Vec<String>,
    summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchingPayload {
    fit_score: i64,
    reasoning: String,
}

pub fn parse_analysis(raw: &str) -> Result<JobAnalysis, SchemaError> {
    let payload: AnalysisPayload =
        serde_json::from_str(strip_code_fence(raw)).map_err(|source| SchemaError::Malformed {
            contract: ANALYSIS,
            source,
        })?;

    let key_criteria: Vec<String> = payload
        .key_criteria
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if key_criteria.is_empty() {
        return Err(SchemaError::EmptyField {
            contract: ANALYSIS,
            field: "keyCriteria",
        });
    }

    Ok(JobAnalysis {
        title: payload.title.trim().to_string(),
        company: payload.company.trim().to_string(),
        deadline: payload.deadline.as_deref().and_then(parse_deadline),
        scam_risk_score: clamp_score("scamRiskScore", payload.scam_risk_score),
        scam_reason: payload
            .scam_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        key_criteria,
        summary: payload.summary.trim().to_string(),
    })
}

pub fn parse_matching(raw: &str) -> Result<FitResult, SchemaError> {
    let payload: MatchingPayload =
        serde_json::from_str(strip_code_fence(raw)).map_err(|source| SchemaError::Malformed {
            contract: MATCHING,
            source,
        })?;

    Ok(FitResult {
        fit_score: clamp_score("fitScore", payload.fit_score),
        reasoning: payload.reasoning.trim().to_string(),
    })
}

fn clamp_score(field: &str, value: i64) -> u8 {
    if !(0..=100).contains(&value) {
        warn!(field, value, "score outside 0-100, clamping");
    }
    value.clamp(0, 100) as u8
}

/// Deadline is optional: anything that is not a calendar date counts as absent.
fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(deadline = raw, "ignoring deadline that is not YYYY-MM-DD");
            None
        }
    }
}

// Some models wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
