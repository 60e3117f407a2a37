use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use opptrack::ai::{create_provider, resolve_model, AVAILABLE_MODELS};
use opptrack::chat::ChatMessage;
use opptrack::models::FitBand;
use opptrack::repository::SqliteBackend;
use opptrack::{App, AppStatus, Config, Opportunity, Pipeline, Tracker};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opptrack")]
#[command(about = "Paste job postings, get scored and tracked opportunities")]
struct Cli {
    /// Model to use (gemini-flash, gemini-flash-lite, gemini-2.5-flash, gemini-pro)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Path of the data file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a job posting or message and track it
    Ingest {
        /// Posting text, or "-" to read from stdin
        content: String,
    },

    /// Paste postings, each ended by a blank line
    Chat,

    /// List opportunities
    List {
        /// Filter by status (interested, drafting, submitted, rejected, offer)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Show opportunity details
    Show {
        /// Opportunity ID (a unique prefix is enough)
        id: String,
    },

    /// Set the status of an opportunity
    Status {
        /// Opportunity ID (a unique prefix is enough)
        id: String,

        /// New status
        status: String,
    },

    /// Move an opportunity to its next status (Interested → Drafting → Submitted)
    Advance {
        /// Opportunity ID (a unique prefix is enough)
        id: String,
    },

    /// Delete an opportunity
    Rm {
        /// Opportunity ID (a unique prefix is enough)
        id: String,
    },

    /// Count opportunities per status
    Stats,

    /// Manage your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// List available models
    Models,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the current profile
    Show,

    /// Update profile fields
    Set {
        /// Your name
        #[arg(long)]
        name: Option<String>,

        /// CV summary text
        #[arg(long)]
        cv: Option<String>,

        /// Read the CV summary from a file
        #[arg(long, conflicts_with = "cv")]
        cv_file: Option<PathBuf>,

        /// Profile URL (empty string clears it)
        #[arg(long)]
        url: Option<String>,
    },

    /// Add an interest keyword
    InterestAdd {
        keyword: String,
    },

    /// Remove an interest keyword
    InterestRm {
        keyword: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("opptrack=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Models = cli.command {
        for name in AVAILABLE_MODELS {
            let spec = resolve_model(name)?;
            println!("{:<20} {}", spec.short_name, spec.model_id);
        }
        return Ok(());
    }

    let mut config = Config::from_env()?;
    if let Some(model) = &cli.model {
        config = config.with_model(model)?;
    }
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }

    let db_path = config.resolved_db_path();
    let backend = SqliteBackend::open(&db_path)
        .with_context(|| format!("Failed to open data file: {}", db_path.display()))?;
    let provider = create_provider(&config)?;
    let app = App::open(Pipeline::new(provider), Arc::new(backend));

    match cli.command {
        Commands::Ingest { content } => {
            let text = if content == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read posting from stdin")?;
                buf
            } else {
                content
            };
            if text.trim().is_empty() {
                bail!("Nothing to analyze.");
            }

            let reply = ChatMessage::reply(&submit_with_timeout(&app, &config, &text).await);
            print_reply(&reply);
            if reply.opportunity().is_none() {
                std::process::exit(1);
            }
        }

        Commands::Chat => {
            let profile = app.profile().await;
            println!("{}\n", ChatMessage::welcome(&profile).text());

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut pending = String::new();
            loop {
                let line = lines.next_line().await?;
                let done = line.is_none();
                if let Some(text) = push_chat_line(&mut pending, line.as_deref()) {
                    let outcome = submit_with_timeout(&app, &config, &text).await;
                    print_reply(&ChatMessage::reply(&outcome));
                    println!();
                }
                if done {
                    break;
                }
            }
        }

        Commands::List { status } => {
            let tracker = app.snapshot().await;
            let records: Vec<&Opportunity> = match status.as_deref() {
                Some(s) => {
                    let status: AppStatus = s.parse().map_err(|e: String| anyhow!(e))?;
                    tracker.filter_by_status(status)
                }
                None => tracker.iter().collect(),
            };
            if records.is_empty() {
                println!("No opportunities found.");
            } else {
                println!(
                    "{:<10} {:<11} {:<30} {:<20} {:>5} {:>5} {:<10}",
                    "ID", "STATUS", "TITLE", "COMPANY", "FIT", "RISK", "DEADLINE"
                );
                println!("{}", "-".repeat(97));
                for opp in records {
                    let risk = if opp.is_high_risk() {
                        format!("!{}", opp.scam_risk_score)
                    } else {
                        opp.scam_risk_score.to_string()
                    };
                    println!(
                        "{:<10} {:<11} {:<30} {:<20} {:>4}% {:>5} {:<10}",
                        short_id(&opp.id),
                        opp.status,
                        truncate(&opp.title, 28),
                        truncate(&opp.company, 18),
                        opp.fit_score,
                        risk,
                        opp.deadline.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Show { id } => {
            let tracker = app.snapshot().await;
            let id = resolve_id(&tracker, &id)?;
            let opp = tracker
                .get(&id)
                .ok_or_else(|| anyhow!("Opportunity {} not found", id))?;
            print_opportunity(opp);
        }

        Commands::Status { id, status } => {
            let status: AppStatus = status.parse().map_err(|e: String| anyhow!(e))?;
            let id = resolve_id(&app.snapshot().await, &id)?;
            let opp = app.set_status(&id, status).await?;
            println!("Marked '{}' as {}.", opp.title, opp.status);
        }

        Commands::Advance { id } => {
            let id = resolve_id(&app.snapshot().await, &id)?;
            match app.advance(&id).await? {
                Some(next) => println!("Moved to {}.", next),
                None => println!("Already at a final status; use 'status' to change it."),
            }
        }

        Commands::Rm { id } => {
            let id = resolve_id(&app.snapshot().await, &id)?;
            let removed = app.remove(&id).await?;
            println!("Deleted '{}' ({}).", removed.title, short_id(&removed.id));
        }

        Commands::Stats => {
            let tracker = app.snapshot().await;
            for (status, count) in tracker.counts_by_status() {
                println!("{:<11} {:>4}", status, count);
            }
            println!("{}", "-".repeat(16));
            println!("{:<11} {:>4}", "Total", tracker.len());
        }

        Commands::Profile { command } => match command {
            ProfileCommands::Show => {
                let profile = app.profile().await;
                println!("Name: {}", profile.name);
                if let Some(url) = &profile.profile_url {
                    println!("URL: {}", url);
                }
                println!("Interests: {}", profile.interests.join(", "));
                println!("\n--- CV Summary ---\n{}", textwrap::fill(&profile.cv_text, 80));
            }

            ProfileCommands::Set {
                name,
                cv,
                cv_file,
                url,
            } => {
                let mut profile = app.profile().await;
                if let Some(name) = name {
                    profile.name = name;
                }
                if let Some(cv) = cv {
                    profile.cv_text = cv;
                }
                if let Some(file) = cv_file {
                    profile.cv_text = std::fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read CV file: {}", file.display()))?;
                }
                if let Some(url) = url {
                    profile.profile_url = Some(url).filter(|u| !u.trim().is_empty());
                }
                app.save_profile(profile).await?;
                println!("Profile saved.");
            }

            ProfileCommands::InterestAdd { keyword } => {
                let mut profile = app.profile().await;
                if profile.add_interest(&keyword) {
                    app.save_profile(profile).await?;
                    println!("Added interest '{}'.", keyword.trim());
                } else {
                    println!("Interest '{}' is already listed.", keyword.trim());
                }
            }

            ProfileCommands::InterestRm { keyword } => {
                let mut profile = app.profile().await;
                if profile.remove_interest(&keyword) {
                    app.save_profile(profile).await?;
                    println!("Removed interest '{}'.", keyword.trim());
                } else {
                    println!("Interest '{}' not found.", keyword.trim());
                }
            }
        },

        Commands::Models => unreachable!("handled before opening storage"),
    }

    Ok(())
}

/// Collects chat input. A blank line or end of input (`None`) closes the posting.
fn push_chat_line(pending: &mut String, line: Option<&str>) -> Option<String> {
    match line {
        Some(line) if !line.trim().is_empty() => {
            pending.push_str(line);
            pending.push('\n');
            None
        }
        _ => {
            let text = std::mem::take(pending);
            let text = text.trim_end();
            (!text.trim().is_empty()).then(|| text.to_string())
        }
    }
}

async fn submit_with_timeout(
    app: &App,
    config: &Config,
    text: &str,
) -> Result<Opportunity, opptrack::PipelineError> {
    match tokio::time::timeout(config.timeout, app.submit(text)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!(timeout = ?config.timeout, "submission timed out");
            Err(opptrack::PipelineError::external("submission timed out"))
        }
    }
}

fn print_reply(reply: &ChatMessage) {
    println!("{}", reply.text());
    if let Some(opp) = reply.opportunity() {
        let shield = if opp.scam_risk_score < 30 { "looks legit" } else { "check carefully" };
        println!("  {} @ {} ({})", opp.title, opp.company, shield);
        println!("  Fit: {}%  Risk: {}%", opp.fit_score, opp.scam_risk_score);
        println!("  \"{}\"", opp.fit_reasoning);
        println!("  Saved to tracker as {}", short_id(&opp.id));
    }
}

fn print_opportunity(opp: &Opportunity) {
    println!("Opportunity {}", opp.id);
    if opp.is_high_risk() {
        println!("!! High scam risk !!");
    }
    println!("Title: {}", opp.title);
    println!("Company: {}", opp.company);
    println!("Status: {}", opp.status);
    if let Some(url) = &opp.url {
        println!("URL: {}", url);
    }
    let band = match opp.fit_band() {
        FitBand::Strong => "strong",
        FitBand::Moderate => "moderate",
        FitBand::Weak => "weak",
    };
    println!("Fit: {}% ({})", opp.fit_score, band);
    println!("Reasoning: {}", opp.fit_reasoning);
    println!("Scam risk: {}%", opp.scam_risk_score);
    if let Some(reason) = &opp.scam_reason {
        println!("Scam reason: {}", reason);
    }
    if let Some(deadline) = opp.deadline {
        println!("Due: {}", deadline);
    }
    println!("Added: {}", opp.date_added.format("%Y-%m-%d %H:%M"));
    if !opp.notes.is_empty() {
        println!("\n--- Notes ---\n{}", textwrap::fill(&opp.notes, 80));
    }
    if let Some(raw) = &opp.raw_text {
        println!("\n--- Raw Text ---\n{}", raw);
    }
}

/// Accepts a full id or any unique prefix of one.
fn resolve_id(tracker: &Tracker, id: &str) -> Result<String> {
    if tracker.get(id).is_some() {
        return Ok(id.to_string());
    }
    let matches: Vec<&Opportunity> = tracker.iter().filter(|o| o.id.starts_with(id)).collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => Err(anyhow!("Opportunity '{}' not found", id)),
        _ => Err(anyhow!("'{}' matches {} opportunities; use a longer prefix", id, matches.len())),
    }
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_posting_spans_lines_until_blank() {
        let mut pending = String::new();
        assert_eq!(push_chat_line(&mut pending, Some("Senior Analyst at Example Co")), None);
        assert_eq!(push_chat_line(&mut pending, Some("Apply: https://jobs.example.com/42")), None);
        assert_eq!(
            push_chat_line(&mut pending, Some("   ")).as_deref(),
            Some("Senior Analyst at Example Co\nApply: https://jobs.example.com/42")
        );
        assert!(pending.is_empty());

        assert_eq!(push_chat_line(&mut pending, Some("")), None);
        assert_eq!(push_chat_line(&mut pending, Some("Last posting")), None);
        assert_eq!(push_chat_line(&mut pending, None).as_deref(), Some("Last posting"));
        assert_eq!(push_chat_line(&mut pending, None), None);
    }
}
