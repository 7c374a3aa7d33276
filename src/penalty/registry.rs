use super::{ChoiceSet, IncidentVote, Snapshot, Summary, VoteError};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

type IncidentHandle = Arc<Mutex<IncidentVote>>;

#[derive(Default)]
struct Incidents {
    by_key: HashMap<String, IncidentHandle>,
    // Keys in the order they were opened; the last one is the "active" incident.
    order: Vec<String>,
}

/// Owns every open incident, keyed by the id of the message that opened it.
///
/// The map sits behind one `RwLock` that is only held long enough to clone an
/// incident handle out of it. Each incident has its own `Mutex`, so votes on
/// different incidents never wait on each other.
pub struct VoteRegistry {
    choices: Arc<ChoiceSet>,
    incidents: RwLock<Incidents>,
}

fn lock(handle: &IncidentHandle) -> MutexGuard<'_, IncidentVote> {
    // A panic can only happen before an incident mutates, so a poisoned
    // incident still satisfies its invariants.
    handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl VoteRegistry {
    pub fn new(choices: ChoiceSet) -> Self {
        Self {
            choices: Arc::new(choices),
            incidents: RwLock::new(Incidents::default()),
        }
    }

    pub fn choices(&self) -> &ChoiceSet {
        &self.choices
    }

    /// Empty tally for an incident that hasn't been opened yet.
    pub fn preview(&self, title: &str, description: &str, submitter: &str) -> Snapshot {
        IncidentVote::new(
            Arc::clone(&self.choices),
            String::new(),
            title.to_string(),
            description.to_string(),
            submitter.to_string(),
        )
        .snapshot()
    }

    pub fn open_incident(
        &self,
        incident_key: &str,
        title: &str,
        description: &str,
        submitter: &str,
    ) -> Result<Snapshot, VoteError> {
        let mut incidents = self
            .incidents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if incidents.by_key.contains_key(incident_key) {
            return Err(VoteError::DuplicateIncident(incident_key.to_string()));
        }

        let incident = IncidentVote::new(
            Arc::clone(&self.choices),
            incident_key.to_string(),
            title.to_string(),
            description.to_string(),
            submitter.to_string(),
        );
        let snapshot = incident.snapshot();

        incidents
            .by_key
            .insert(incident_key.to_string(), Arc::new(Mutex::new(incident)));
        incidents.order.push(incident_key.to_string());

        info!("Opened penalty incident {} ({})", incident_key, title);
        Ok(snapshot)
    }

    pub fn get(&self, incident_key: &str) -> Option<Snapshot> {
        self.snapshot(incident_key).ok()
    }

    pub fn most_recent(&self) -> Option<Snapshot> {
        let handle = self.read(|incidents| {
            incidents
                .order
                .last()
                .and_then(|key| incidents.by_key.get(key))
                .cloned()
        })?;
        Some(lock(&handle).snapshot())
    }

    pub fn add_vote(
        &self,
        incident_key: &str,
        voter_id: &str,
        choice: &str,
    ) -> Result<Snapshot, VoteError> {
        let handle = self.require(incident_key)?;
        lock(&handle).add_vote(voter_id, choice)
    }

    pub fn remove_vote(&self, incident_key: &str, voter_id: &str) -> Result<Snapshot, VoteError> {
        let handle = self.require(incident_key)?;
        lock(&handle).remove_vote(voter_id)
    }

    pub fn snapshot(&self, incident_key: &str) -> Result<Snapshot, VoteError> {
        let handle = self.require(incident_key)?;
        Ok(lock(&handle).snapshot())
    }

    pub fn summary(&self, incident_key: &str) -> Result<Summary, VoteError> {
        let handle = self.require(incident_key)?;
        Ok(lock(&handle).summary())
    }

    /// Snapshot and summary taken under one lock, so the counts always agree
    /// with the voter lists.
    pub fn status(&self, incident_key: &str) -> Result<(Snapshot, Summary), VoteError> {
        let handle = self.require(incident_key)?;
        let incident = lock(&handle);
        Ok((incident.snapshot(), incident.summary()))
    }

    fn read<T>(&self, f: impl FnOnce(&Incidents) -> T) -> T {
        let incidents = self
            .incidents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&incidents)
    }

    fn handle(&self, incident_key: &str) -> Option<IncidentHandle> {
        self.read(|incidents| incidents.by_key.get(incident_key).cloned())
    }

    fn require(&self, incident_key: &str) -> Result<IncidentHandle, VoteError> {
        self.handle(incident_key)
            .ok_or_else(|| VoteError::IncidentNotFound(incident_key.to_string()))
    }
}

impl Default for VoteRegistry {
    fn default() -> Self {
        Self::new(ChoiceSet::default())
    }
}
