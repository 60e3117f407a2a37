use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::models::{AppStatus, FitResult, JobAnalysis, Opportunity};

pub const UNKNOWN_ROLE: &str = "Unknown Role";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const NO_REASONING: &str = "No analysis available";

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhttps?://[^\s/?#]+[^\s]*").expect("URL pattern is valid")
});

/// Builds a new tracked record from one pipeline run. Total: never fails, never touches the network.
pub fn assemble(analysis: JobAnalysis, fit: FitResult, raw_text: &str) -> Opportunity {
    Opportunity {
        id: Uuid::new_v4().to_string(),
        title: non_empty_or(analysis.title, UNKNOWN_ROLE),
        company: non_empty_or(analysis.company, UNKNOWN_COMPANY),
        url: extract_url(raw_text),
        status: AppStatus::Interested,
        fit_score: fit.fit_score,
        fit_reasoning: non_empty_or(fit.reasoning, NO_REASONING),
        scam_risk_score: analysis.scam_risk_score,
        scam_reason: analysis.scam_reason,
        deadline: analysis.deadline,
        date_added: Utc::now(),
        notes: format!("Extracted from chat.\n\nSummary: {}", analysis.summary),
        raw_text: Some(raw_text.to_string()),
    }
}

/// First `http(s)://` token in `text`, without trailing sentence punctuation.
pub fn extract_url(text: &str) -> Option<String> {
    URL_RE
        .find_iter(text)
        .map(|m| trim_url_tail(m.as_str()))
        .find(|url| url.split_once("://").is_some_and(|(_, host)| !host.is_empty()))
        .map(str::to_string)
}

// A closing bracket stays when the token opened it, as in `/wiki/Rust_(language)`.
fn trim_url_tail(mut url: &str) -> &str {
    while let Some(last) = url.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '>' | '"' | '\'' => true,
            ')' => unbalanced(url, '(', ')'),
            ']' => unbalanced(url, '[', ']'),
            '}' => unbalanced(url, '{', '}'),
            _ => false,
        };
        if !strip {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

fn unbalanced(url: &str, open: char, close: char) -> bool {
    url.matches(close).count() > url.matches(open).count()
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn analysis() -> JobAnalysis {
        JobAnalysis {
            title: "Great Role".to_string(),
            company: "Example Co".to_string(),
            deadline: NaiveDate::from_ymd_opt(2026, 11, 1),
            scam_risk_score: 10,
            scam_reason: Some("Established company".to_string()),
            key_criteria: vec!["SQL".to_string(), "3+ yrs".to_string()],
            summary: "Analyst role on the growth team. Hybrid in Berlin.".to_string(),
        }
    }

    fn fit() -> FitResult {
        FitResult {
            fit_score: 77,
            reasoning: "Good SQL overlap.".to_string(),
        }
    }

    #[test]
    fn test_assemble_posting_with_url() {
        let raw = "Apply now: https://jobs.example.com/42 great role";
        let opp = assemble(analysis(), fit(), raw);

        assert_eq!(opp.url.as_deref(), Some("https://jobs.example.com/42"));
        assert_eq!(opp.status, AppStatus::Interested);
        assert_eq!(opp.title, "Great Role");
        assert_eq!(opp.company, "Example Co");
        assert_eq!(opp.fit_score, 77);
        assert_eq!(opp.fit_reasoning, "Good SQL overlap.");
        assert_eq!(opp.scam_risk_score, 10);
        assert_eq!(opp.scam_reason.as_deref(), Some("Established company"));
        assert_eq!(opp.deadline, NaiveDate::from_ymd_opt(2026, 11, 1));
        assert!(opp.notes.contains("Analyst role on the growth team. Hybrid in Berlin."));
        assert_eq!(opp.raw_text.as_deref(), Some(raw));
        assert!(!opp.id.is_empty());
    }

    #[test]
    fn test_assemble_defaults_blank_fields() {
        let mut a = analysis();
        a.title = "  ".to_string();
        a.company = String::new();
        let f = FitResult {
            fit_score: 0,
            reasoning: String::new(),
        };

        let opp = assemble(a, f, "no link here");
        assert_eq!(opp.title, UNKNOWN_ROLE);
        assert_eq!(opp.company, UNKNOWN_COMPANY);
        assert_eq!(opp.fit_reasoning, NO_REASONING);
        assert_eq!(opp.url, None);
    }

    #[test]
    fn test_same_text_twice_gives_distinct_records() {
        let raw = "Senior engineer at Example Co";
        let first = assemble(analysis(), fit(), raw);
        let second = assemble(analysis(), fit(), raw);
        assert_ne!(first.id, second.id);
        assert!(second.date_added >= first.date_added);
    }

    #[test]
    fn test_extract_url() {
        assert_eq!(
            extract_url("see HTTPS://Example.com/jobs?id=7."),
            Some("HTTPS://Example.com/jobs?id=7".to_string())
        );
        assert_eq!(
            extract_url("(details at http://a.io/x), then https://b.io"),
            Some("http://a.io/x".to_string())
        );
        assert_eq!(extract_url("broken http:// then https://ok.dev/1"), Some("https://ok.dev/1".to_string()));
        assert_eq!(extract_url("mailto:hr@example.com"), None);
        assert_eq!(
            extract_url("[apply](https://jobs.example.com/42]), soon"),
            Some("https://jobs.example.com/42".to_string())
        );
        assert_eq!(extract_url("nothing to see"), None);
        assert_eq!(extract_url(""), None);
    }

    #[test]
    fn test_extract_url_keeps_balanced_brackets() {
        assert_eq!(
            extract_url("See https://en.wikipedia.org/wiki/Rust_(programming_language) now"),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)".to_string())
        );
        assert_eq!(
            extract_url("(see https://en.wikipedia.org/wiki/Rust_(programming_language))."),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)".to_string())
        );
        assert_eq!(
            extract_url("Form: https://forms.example.com/a?f[0]=x."),
            Some("https://forms.example.com/a?f[0]=x".to_string())
        );
    }
}
