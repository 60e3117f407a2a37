//! The tracked state of one user: profile plus opportunity collection.
//!
//! Both documents are loaded once when the [`App`] is opened and written back in
//! full after every mutation. Each mutation is applied to a copy, persisted,
//! and only then made visible, so memory and storage never disagree.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::PipelineError;
use crate::models::{AppStatus, Opportunity, UserProfile};
use crate::pipeline::Pipeline;
use crate::repository::{Repository, StorageBackend, OPPORTUNITIES_KEY, PROFILE_KEY};
use crate::seed::{default_profile, seed_opportunities};
use crate::store::Tracker;

pub struct App {
    pipeline: Pipeline,
    profile: Mutex<UserProfile>,
    tracker: Mutex<Tracker>,
    profiles: Repository<UserProfile>,
    opportunities: Repository<Vec<Opportunity>>,
}

impl App {
    pub fn open(pipeline: Pipeline, backend: Arc<dyn StorageBackend>) -> Self {
        let profiles = Repository::new(backend.clone(), PROFILE_KEY, default_profile);
        let opportunities = Repository::new(backend, OPPORTUNITIES_KEY, seed_opportunities);

        let profile = profiles.load();
        let tracker = Tracker::from_records(opportunities.load());
        info!(opportunities = tracker.len(), "loaded tracker state");

        Self {
            pipeline,
            profile: Mutex::new(profile),
            tracker: Mutex::new(tracker),
            profiles,
            opportunities,
        }
    }

    /// Runs the pipeline for one text and stores the result.
    ///
    /// Concurrent submissions are independent; whichever finishes assembly first is
    /// inserted first.
    pub async fn submit(&self, raw_text: &str) -> Result<Opportunity, PipelineError> {
        let profile = self.profile.lock().await.clone();
        let opportunity = self.pipeline.run(&profile, raw_text).await.inspect_err(|e| {
            error!(error = %e, "submission failed");
        })?;

        let mut tracker = self.tracker.lock().await;
        let mut next = tracker.clone();
        next.add(opportunity.clone())?;
        self.opportunities.save(&next.records().to_vec()).await?;
        *tracker = next;
        Ok(opportunity)
    }

    pub async fn profile(&self) -> UserProfile {
        self.profile.lock().await.clone()
    }

    /// Replaces the profile wholesale.
    pub async fn save_profile(&self, profile: UserProfile) -> Result<(), PipelineError> {
        let mut current = self.profile.lock().await;
        self.profiles.save(&profile).await?;
        *current = profile;
        Ok(())
    }

    pub async fn set_status(&self, id: &str, status: AppStatus) -> Result<Opportunity, PipelineError> {
        self.mutate(|t| t.set_status(id, status).cloned()).await
    }

    pub async fn advance(&self, id: &str) -> Result<Option<AppStatus>, PipelineError> {
        self.mutate(|t| t.advance(id)).await
    }

    pub async fn remove(&self, id: &str) -> Result<Opportunity, PipelineError> {
        self.mutate(|t| t.remove(id)).await
    }

    /// A copy of the current collection for read-only views.
    pub async fn snapshot(&self) -> Tracker {
        self.tracker.lock().await.clone()
    }

    async fn mutate<R>(
        &self,
        op: impl FnOnce(&mut Tracker) -> Result<R, crate::error::StoreError>,
    ) -> Result<R, PipelineError> {
        let mut tracker = self.tracker.lock().await;
        let mut next = tracker.clone();
        let result = op(&mut next)?;
        self.opportunities.save(&next.records().to_vec()).await?;
        *tracker = next;
        Ok(result)
    }
}
