use std::collections::HashMap;

use tracing::debug;

use super::domain::{Application, ApplicationId};
use super::index::{has_applied, AppliedIndex};
use super::stats::ApplicationStats;
use crate::workflows::jobs::JobId;

/// Proof that a fetch was started at a given cache epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket(u64);

/// Client copy of the server's application list.
///
/// Never patched in place: every change arrives as a full list from a fetch whose ticket is
/// still current. Invalidating or starting a newer fetch supersedes older tickets, so a late
/// response can never overwrite a fresher one.
#[derive(Debug, Clone, Default)]
pub struct ApplicationCache {
    applications: Vec<Application>,
    loaded: bool,
    stale: bool,
    epoch: u64,
}

impl ApplicationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn get(&self, id: ApplicationId) -> Option<&Application> {
        self.applications
            .iter()
            .find(|application| application.id == id)
    }

    /// Whether the cached list must be fetched before it can be trusted.
    pub fn needs_refresh(&self) -> bool {
        !self.loaded || self.stale
    }

    /// Mark the list out of date and supersede any fetch already in flight.
    pub fn invalidate(&mut self) {
        self.stale = true;
        self.epoch += 1;
    }

    /// Drop everything, e.g. on logout.
    pub fn clear(&mut self) {
        self.applications.clear();
        self.loaded = false;
        self.stale = false;
        self.epoch += 1;
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.epoch += 1;
        FetchTicket(self.epoch)
    }

    /// Install a fetched list. Returns `false` when the ticket was superseded and the
    /// response was discarded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, applications: Vec<Application>) -> bool {
        if ticket.0 != self.epoch {
            debug!(
                ticket = ticket.0,
                epoch = self.epoch,
                "discarding superseded application fetch"
            );
            return false;
        }

        self.applications = dedupe_by_id(applications);
        self.loaded = true;
        self.stale = false;
        true
    }

    pub fn stats(&self) -> ApplicationStats {
        ApplicationStats::from_applications(&self.applications)
    }

    pub fn has_applied(&self, job_id: JobId) -> bool {
        has_applied(job_id, &self.applications)
    }

    pub fn applied_index(&self) -> AppliedIndex {
        AppliedIndex::from_applications(&self.applications)
    }
}

/// Keep one entry per id, the last one received, at the position it first appeared.
fn dedupe_by_id(applications: Vec<Application>) -> Vec<Application> {
    let mut positions: HashMap<ApplicationId, usize> = HashMap::with_capacity(applications.len());
    let mut unique: Vec<Application> = Vec::with_capacity(applications.len());

    for application in applications {
        match positions.get(&application.id) {
            Some(&index) => unique[index] = application,
            None => {
                positions.insert(application.id, unique.len());
                unique.push(application);
            }
        }
    }

    unique
}
