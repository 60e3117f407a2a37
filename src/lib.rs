//! Turns pasted job postings into scored, status-tracked opportunities.

pub mod ai;
pub mod app;
pub mod assemble;
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod seed;
pub mod store;

pub use app::App;
pub use config::Config;
pub use error::{PipelineError, StorageError, StoreError};
pub use models::{AppStatus, FitResult, JobAnalysis, Opportunity, UserProfile};
pub use pipeline::Pipeline;
pub use store::Tracker;
