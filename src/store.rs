//! In-memory collection of tracked opportunities, newest first.
//!
//! All mutations go through [`Tracker::add`], [`Tracker::set_status`] and
//! [`Tracker::remove`]. Status changes are deliberately unconstrained: any
//! status may follow any other, and [`Tracker::set_status`] is the single place
//! a transition table would be enforced if one is ever introduced.

use std::collections::BTreeMap;
use tracing::warn;

use crate::error::StoreError;
use crate::models::{AppStatus, Opportunity};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tracker {
    opportunities: Vec<Opportunity>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already ordered collection, e.g. one loaded from storage.
    /// Later records whose id was already seen are dropped, and scores are
    /// pulled back into 0-100.
    pub fn from_records(records: Vec<Opportunity>) -> Self {
        let mut opportunities: Vec<Opportunity> = Vec::with_capacity(records.len());
        for mut record in records {
            if opportunities.iter().any(|o| o.id == record.id) {
                warn!(id = %record.id, "dropping stored record with duplicate id");
                continue;
            }
            record.fit_score = clamp_stored(&record.id, "fitScore", record.fit_score);
            record.scam_risk_score =
                clamp_stored(&record.id, "scamRiskScore", record.scam_risk_score);
            opportunities.push(record);
        }
        Self { opportunities }
    }

    pub fn records(&self) -> &[Opportunity] {
        &self.opportunities
    }

    pub fn iter(&self) -> impl Iterator<Item = &Opportunity> {
        self.opportunities.iter()
    }

    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    /// Prepends a record. Ids come from the assembler, so a clash is a bug in the caller.
    pub fn add(&mut self, opportunity: Opportunity) -> Result<(), StoreError> {
        if self.get(&opportunity.id).is_some() {
            return Err(StoreError::DuplicateId(opportunity.id));
        }
        self.opportunities.insert(0, opportunity);
        Ok(())
    }

    /// Replaces the status of one record, leaving every other field untouched.
    pub fn set_status(&mut self, id: &str, status: AppStatus) -> Result<&Opportunity, StoreError> {
        let opportunity = self
            .opportunities
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        opportunity.status = status;
        Ok(opportunity)
    }

    /// Moves a record one step along Interested → Drafting → Submitted.
    /// Returns `Ok(None)` when its status has no conventional next step.
    pub fn advance(&mut self, id: &str) -> Result<Option<AppStatus>, StoreError> {
        let current = self
            .get(id)
            .map(|o| o.status)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        match current.next() {
            Some(next) => {
                self.set_status(id, next)?;
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    /// Deletes a record. Removing an unknown (or already removed) id reports `NotFound`.
    pub fn remove(&mut self, id: &str) -> Result<Opportunity, StoreError> {
        let index = self
            .opportunities
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(self.opportunities.remove(index))
    }

    pub fn filter_by_status(&self, status: AppStatus) -> Vec<&Opportunity> {
        self.opportunities
            .iter()
            .filter(|o| o.status == status)
            .collect()
    }

    /// Count per status. Every status is present, so the values always sum to `len()`.
    pub fn counts_by_status(&self) -> BTreeMap<AppStatus, usize> {
        let mut counts: BTreeMap<AppStatus, usize> =
            AppStatus::ALL.into_iter().map(|s| (s, 0)).collect();
        for o in &self.opportunities {
            *counts.entry(o.status).or_default() += 1;
        }
        counts
    }
}

fn clamp_stored(id: &str, field: &str, score: u8) -> u8 {
    if score > 100 {
        warn!(id, field, score, "stored score above 100, clamping");
        return 100;
    }
    score
}
