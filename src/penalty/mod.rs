pub mod registry;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub use registry::VoteRegistry;

/// Shown in a summary for a choice nobody picked.
pub const NO_VOTES_PLACEHOLDER: &str = "No votes";

// Each choice is a button: four rows of five, one row left for the controls.
pub const MAX_CHOICES: usize = 20;
// Discord's button label limit; also keeps `penVote_<label>` under 100 chars.
pub const MAX_LABEL_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("an incident is already open for {0}")]
    DuplicateIncident(String),
    #[error("{0} has already voted on this incident")]
    AlreadyVoted(String),
    #[error("{0} has no vote on this incident")]
    NoExistingVote(String),
    #[error("{0:?} is not one of the configured penalty choices")]
    InvalidChoice(String),
    #[error("no incident found for {0}")]
    IncidentNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceSetError {
    #[error("at least one penalty choice is required")]
    Empty,
    #[error("penalty choice {0:?} is listed more than once")]
    Duplicate(String),
    #[error("{0} penalty choices configured, at most {max} fit on a message", max = MAX_CHOICES)]
    TooMany(usize),
    #[error("penalty choice {0:?} is longer than {max} characters", max = MAX_LABEL_LEN)]
    LabelTooLong(String),
}

/// The fixed, ordered set of penalty labels voters pick from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceSet {
    labels: Vec<String>,
}

impl ChoiceSet {
    pub fn new<I, S>(labels: I) -> Result<Self, ChoiceSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into().trim().to_string();
            if label.chars().count() > MAX_LABEL_LEN {
                return Err(ChoiceSetError::LabelTooLong(label));
            }
            if seen.contains(&label) {
                return Err(ChoiceSetError::Duplicate(label));
            }
            seen.push(label);
        }

        if seen.is_empty() {
            return Err(ChoiceSetError::Empty);
        }
        if seen.len() > MAX_CHOICES {
            return Err(ChoiceSetError::TooMany(seen.len()));
        }

        Ok(Self { labels: seen })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

impl Default for ChoiceSet {
    fn default() -> Self {
        Self {
            labels: ["0", "5", "10", "20"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub choice: String,
    pub count: usize,
}

/// Aggregate view of an incident: counts per choice in choice order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub incident_key: String,
    pub title: String,
    pub description: String,
    pub submitter: String,
    pub opened_at: DateTime<Utc>,
    pub tallies: Vec<Tally>,
}

impl Snapshot {
    pub fn total_votes(&self) -> usize {
        self.tallies.iter().map(|t| t.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub choice: String,
    pub voters: Vec<String>,
}

/// Per-voter view of an incident. Voters are listed in the order they voted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub incident_key: String,
    pub title: String,
    pub rows: Vec<SummaryRow>,
}

#[derive(Debug, Clone, Copy)]
struct Ballot {
    choice: usize,
    seq: u64,
}

/// Vote record for a single disputed incident.
///
/// `counts[i]` always equals the number of ballots whose choice is `i`; the
/// two are only ever changed together inside `add_vote`/`remove_vote`, after
/// every precondition has been checked.
#[derive(Debug, Clone)]
pub struct IncidentVote {
    incident_key: String,
    title: String,
    description: String,
    submitter: String,
    opened_at: DateTime<Utc>,
    choices: Arc<ChoiceSet>,
    counts: Vec<usize>,
    ballots: HashMap<String, Ballot>,
    next_seq: u64,
}

impl IncidentVote {
    pub fn new(
        choices: Arc<ChoiceSet>,
        incident_key: String,
        title: String,
        description: String,
        submitter: String,
    ) -> Self {
        let counts = vec![0; choices.len()];
        Self {
            incident_key,
            title,
            description,
            submitter,
            opened_at: Utc::now(),
            choices,
            counts,
            ballots: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn add_vote(&mut self, voter_id: &str, choice: &str) -> Result<Snapshot, VoteError> {
        let index = self
            .choices
            .position(choice)
            .ok_or_else(|| VoteError::InvalidChoice(choice.to_string()))?;

        if self.ballots.contains_key(voter_id) {
            return Err(VoteError::AlreadyVoted(voter_id.to_string()));
        }

        self.counts[index] += 1;
        self.ballots.insert(
            voter_id.to_string(),
            Ballot {
                choice: index,
                seq: self.next_seq,
            },
        );
        self.next_seq += 1;

        Ok(self.snapshot())
    }

    pub fn remove_vote(&mut self, voter_id: &str) -> Result<Snapshot, VoteError> {
        let ballot = self
            .ballots
            .remove(voter_id)
            .ok_or_else(|| VoteError::NoExistingVote(voter_id.to_string()))?;

        self.counts[ballot.choice] -= 1;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> Snapshot {
        let tallies = self
            .choices
            .labels()
            .iter()
            .zip(&self.counts)
            .map(|(choice, count)| Tally {
                choice: choice.clone(),
                count: *count,
            })
            .collect();

        Snapshot {
            incident_key: self.incident_key.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            submitter: self.submitter.clone(),
            opened_at: self.opened_at,
            tallies,
        }
    }

    pub fn summary(&self) -> Summary {
        let mut ordered: Vec<(&String, &Ballot)> = self.ballots.iter().collect();
        ordered.sort_by_key(|(_, ballot)| ballot.seq);

        let rows = self
            .choices
            .labels()
            .iter()
            .enumerate()
            .map(|(index, choice)| SummaryRow {
                choice: choice.clone(),
                voters: ordered
                    .iter()
                    .filter(|(_, ballot)| ballot.choice == index)
                    .map(|(voter, _)| (*voter).clone())
                    .collect(),
            })
            .collect();

        Summary {
            incident_key: self.incident_key.clone(),
            title: self.title.clone(),
            rows,
        }
    }
}

#[cfg(test)]
impl Snapshot {
    pub fn count_for(&self, choice: &str) -> Option<usize> {
        self.tallies.iter().find(|t| t.choice == choice).map(|t| t.count)
    }
}

#[cfg(test)]
impl Summary {
    pub fn voters_for(&self, choice: &str) -> Option<&[String]> {
        self.rows
            .iter()
            .find(|r| r.choice == choice)
            .map(|r| r.voters.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl IncidentVote {
        fn voter_count(&self) -> usize {
            self.ballots.len()
        }

        fn choice_of(&self, voter_id: &str) -> Option<&str> {
            self.ballots
                .get(voter_id)
                .map(|b| self.choices.labels()[b.choice].as_str())
        }
    }

    fn incident() -> IncidentVote {
        IncidentVote::new(
            Arc::new(ChoiceSet::default()),
            "msg-1".to_string(),
            "Cy v RS - Pen on RS".to_string(),
            "https://example.invalid/clip.gif".to_string(),
            "1234".to_string(),
        )
    }

    fn counts(snapshot: &Snapshot) -> Vec<usize> {
        snapshot.tallies.iter().map(|t| t.count).collect()
    }

    #[test]
    fn test_choice_set_validation() {
        assert!(matches!(ChoiceSet::new(Vec::<String>::new()), Err(ChoiceSetError::Empty)));
        assert_eq!(
            ChoiceSet::new(["0", "5", " 5 "]),
            Err(ChoiceSetError::Duplicate("5".to_string()))
        );

        let many: Vec<String> = (0..=MAX_CHOICES).map(|i| i.to_string()).collect();
        assert_eq!(ChoiceSet::new(many), Err(ChoiceSetError::TooMany(MAX_CHOICES + 1)));
        assert!(ChoiceSet::new((0..MAX_CHOICES).map(|i| i.to_string())).is_ok());

        let long = "x".repeat(MAX_LABEL_LEN + 1);
        assert_eq!(
            ChoiceSet::new(["0", long.as_str()]),
            Err(ChoiceSetError::LabelTooLong(long.clone()))
        );
        assert!(ChoiceSet::new(["x".repeat(MAX_LABEL_LEN)]).is_ok());

        let set = ChoiceSet::new([" 0", "10 "]).unwrap();
        assert_eq!(set.labels(), ["0", "10"]);
        assert_eq!(set.position("10"), Some(1));
        assert_eq!(set.position("20"), None);
    }

    #[test]
    fn test_new_incident_is_empty() {
        let vote = incident();
        let snapshot = vote.snapshot();
        assert_eq!(snapshot.incident_key, "msg-1");
        assert_eq!(snapshot.submitter, "1234");
        assert_eq!(counts(&snapshot), vec![0, 0, 0, 0]);
        assert_eq!(snapshot.total_votes(), 0);
        assert_eq!(vote.voter_count(), 0);
    }

    #[test]
    fn test_end_to_end_example() {
        let mut vote = incident();

        let s = vote.add_vote("u1", "10").unwrap();
        assert_eq!(counts(&s), vec![0, 0, 1, 0]);

        let s = vote.add_vote("u2", "10").unwrap();
        assert_eq!(s.count_for("10"), Some(2));

        let s = vote.remove_vote("u1").unwrap();
        assert_eq!(s.count_for("10"), Some(1));

        let summary = vote.summary();
        assert_eq!(summary.voters_for("10").unwrap(), ["u2"]);
        assert!(summary.voters_for("0").unwrap().is_empty());
    }

    #[test]
    fn test_add_then_remove_restores_counts() {
        let mut vote = incident();
        vote.add_vote("u1", "5").unwrap();
        let before = vote.snapshot();

        vote.add_vote("u2", "20").unwrap();
        let after = vote.remove_vote("u2").unwrap();

        assert_eq!(before.tallies, after.tallies);
        assert_eq!(vote.choice_of("u2"), None);
    }

    #[test]
    fn test_double_vote_rejected_without_change() {
        let mut vote = incident();
        vote.add_vote("u1", "0").unwrap();
        let before = vote.snapshot();

        assert_eq!(
            vote.add_vote("u1", "20"),
            Err(VoteError::AlreadyVoted("u1".to_string()))
        );
        assert_eq!(vote.snapshot(), before);
        assert_eq!(vote.choice_of("u1"), Some("0"));
    }

    #[test]
    fn test_remove_without_vote_rejected() {
        let mut vote = incident();
        vote.add_vote("u1", "5").unwrap();
        let before = vote.snapshot();

        assert_eq!(
            vote.remove_vote("u9"),
            Err(VoteError::NoExistingVote("u9".to_string()))
        );
        assert_eq!(vote.snapshot(), before);
    }

    #[test]
    fn test_invalid_choice_rejected() {
        let mut vote = incident();
        assert_eq!(
            vote.add_vote("u1", "15"),
            Err(VoteError::InvalidChoice("15".to_string()))
        );
        assert_eq!(vote.voter_count(), 0);
        assert_eq!(vote.snapshot().total_votes(), 0);
    }

    #[test]
    fn test_revote_after_remove() {
        let mut vote = incident();
        vote.add_vote("u1", "5").unwrap();
        vote.remove_vote("u1").unwrap();
        let s = vote.add_vote("u1", "20").unwrap();

        assert_eq!(counts(&s), vec![0, 0, 0, 1]);
        assert_eq!(vote.choice_of("u1"), Some("20"));
    }

    #[test]
    fn test_counts_match_voters() {
        let mut vote = incident();
        let plan = [("a", "0"), ("b", "5"), ("c", "5"), ("d", "20"), ("e", "10")];
        for (voter, choice) in plan {
            vote.add_vote(voter, choice).unwrap();
        }
        vote.remove_vote("c").unwrap();
        assert!(vote.add_vote("a", "10").is_err());

        let snapshot = vote.snapshot();
        assert_eq!(snapshot.total_votes(), vote.voter_count());

        let summary = vote.summary();
        for tally in &snapshot.tallies {
            assert_eq!(summary.voters_for(&tally.choice).unwrap().len(), tally.count);
        }
    }

    #[test]
    fn test_summary_orders_voters_by_vote_time() {
        let mut vote = incident();
        for voter in ["zed", "amy", "mo"] {
            vote.add_vote(voter, "10").unwrap();
        }
        vote.remove_vote("zed").unwrap();
        vote.add_vote("zed", "10").unwrap();

        let summary = vote.summary();
        assert_eq!(summary.voters_for("10").unwrap(), ["amy", "mo", "zed"]);
    }
}
