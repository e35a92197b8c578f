//! Poll state machine.
//!
//! A room carries one poll cell. The phase moves `Idle -> Active -> Ended ->
//! Closed`; starting a new poll is allowed from any phase and cancelling
//! returns to `Idle`. Illegal transitions are silent no-ops. The terminal
//! tally of the most recent ended poll survives in `last_results` until a
//! later poll ends or a cancel discards it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::mem;

use serde::Serialize;
use uuid::Uuid;

/// Fixed number of agreement levels in a gradients poll (`OPT_1..OPT_8`).
pub const GRADIENT_LEVELS: usize = 8;

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_ENDED: &str = "ENDED";
pub const STATUS_CLOSED: &str = "CLOSED";

/// What kind of poll is running and, for multiselect variants, its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollKind {
    YesNo,
    Gradients,
    Multiselect {
        options: Vec<String>,
        /// `true` for `MULTISELECT_MULTIPLE`: each session owns a toggleable
        /// set of selections instead of a single replaceable one.
        multiple: bool,
        votes_per_participant: u32,
    },
}

impl PollKind {
    pub fn wire_name(&self) -> &'static str {
        match self {
            PollKind::YesNo => "YES_NO",
            PollKind::Gradients => "GRADIENTS",
            PollKind::Multiselect { multiple: false, .. } => "MULTISELECT",
            PollKind::Multiselect { multiple: true, .. } => "MULTISELECT_MULTIPLE",
        }
    }

    /// Option keys this poll tallies under.
    pub fn option_keys(&self) -> Vec<String> {
        match self {
            PollKind::YesNo => vec!["YES".to_string(), "NO".to_string()],
            PollKind::Gradients => (1..=GRADIENT_LEVELS).map(|i| format!("OPT_{i}")).collect(),
            PollKind::Multiselect { options, .. } => {
                (0..options.len()).map(|i| format!("OPT_{i}")).collect()
            }
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            PollKind::Multiselect { options, .. } => Some(options),
            _ => None,
        }
    }

    pub fn votes_per_participant(&self) -> u32 {
        match self {
            PollKind::Multiselect {
                multiple: true,
                votes_per_participant,
                ..
            } => *votes_per_participant,
            _ => 1,
        }
    }
}

/// One session's recorded vote(s).
#[derive(Debug, Clone)]
enum Ballot {
    Single(String),
    Multi(BTreeSet<String>),
}

impl Ballot {
    fn size(&self) -> usize {
        match self {
            Ballot::Single(_) => 1,
            Ballot::Multi(set) => set.len(),
        }
    }
}

/// A poll that is currently accepting votes or showing its results.
#[derive(Debug, Clone)]
pub struct LivePoll {
    question: String,
    kind: PollKind,
    tallies: BTreeMap<String, u32>,
    ballots: HashMap<Uuid, Ballot>,
}

impl LivePoll {
    fn new(question: String, kind: PollKind) -> Self {
        let tallies = kind.option_keys().into_iter().map(|k| (k, 0)).collect();
        Self {
            question,
            kind,
            tallies,
            ballots: HashMap::new(),
        }
    }

    /// Record a vote for `key`. Returns `false` when the vote is rejected:
    /// unknown key, or a full selection set in a multiple-selection poll.
    fn cast(&mut self, session: Uuid, key: &str) -> bool {
        if !self.tallies.contains_key(key) {
            return false;
        }
        match &self.kind {
            PollKind::Multiselect {
                multiple: true,
                votes_per_participant,
                ..
            } => {
                let cap = *votes_per_participant as usize;
                let entry = self
                    .ballots
                    .entry(session)
                    .or_insert_with(|| Ballot::Multi(BTreeSet::new()));
                let Ballot::Multi(set) = entry else {
                    return false;
                };
                if set.remove(key) {
                    // Toggle off an existing selection.
                    decrement(&mut self.tallies, key);
                    true
                } else if set.len() >= cap {
                    false
                } else {
                    set.insert(key.to_string());
                    increment(&mut self.tallies, key);
                    true
                }
            }
            _ => {
                let previous = match self.ballots.get(&session) {
                    Some(Ballot::Single(prev)) => Some(prev.clone()),
                    _ => None,
                };
                if let Some(prev) = previous {
                    decrement(&mut self.tallies, &prev);
                }
                increment(&mut self.tallies, key);
                self.ballots.insert(session, Ballot::Single(key.to_string()));
                true
            }
        }
    }

    fn total_votes(&self) -> u32 {
        self.tallies.values().sum()
    }

    #[cfg(test)]
    fn ballot_total(&self) -> usize {
        self.ballots.values().map(Ballot::size).sum()
    }

    fn results(&self) -> PollResults {
        PollResults {
            question: self.question.clone(),
            poll_type: self.kind.wire_name().to_string(),
            results: self.tallies.clone(),
            total_votes: self.total_votes(),
            options: self.kind.options().map(<[String]>::to_vec),
        }
    }
}

fn increment(tallies: &mut BTreeMap<String, u32>, key: &str) {
    if let Some(count) = tallies.get_mut(key) {
        *count += 1;
    }
}

fn decrement(tallies: &mut BTreeMap<String, u32>, key: &str) {
    if let Some(count) = tallies.get_mut(key) {
        *count = count.saturating_sub(1);
    }
}

/// Terminal tally of an ended poll, preserved across `close`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub question: String,
    pub poll_type: String,
    pub results: BTreeMap<String, u32>,
    pub total_votes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Poll view as embedded in a room snapshot.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollStateView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub results: BTreeMap<String, u32>,
    pub total_votes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_results: Option<PollResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes_per_participant: Option<u32>,
}

#[derive(Debug, Clone, Default)]
enum PollPhase {
    #[default]
    Idle,
    Active(LivePoll),
    Ended(LivePoll),
    Closed,
}

/// The per-room poll slot.
#[derive(Debug, Clone, Default)]
pub struct PollCell {
    phase: PollPhase,
    last_results: Option<PollResults>,
}

impl PollCell {
    /// Start a new poll from any phase. Tallies and ballots reset; the last
    /// terminal results stay until this poll ends.
    pub fn start(&mut self, question: String, kind: PollKind) {
        self.phase = PollPhase::Active(LivePoll::new(question, kind));
    }

    /// Accepted only while active; returns whether the tally changed.
    pub fn cast(&mut self, session: Uuid, key: &str) -> bool {
        match &mut self.phase {
            PollPhase::Active(poll) => poll.cast(session, key),
            _ => false,
        }
    }

    /// `Active -> Ended`, capturing the terminal tally.
    pub fn end(&mut self) {
        match mem::take(&mut self.phase) {
            PollPhase::Active(poll) => {
                self.last_results = Some(poll.results());
                self.phase = PollPhase::Ended(poll);
            }
            other => self.phase = other,
        }
    }

    /// `Ended -> Closed`, discarding the live poll but keeping the results.
    pub fn close(&mut self) {
        if matches!(self.phase, PollPhase::Ended(_)) {
            self.phase = PollPhase::Closed;
        }
    }

    /// Back to `Idle` from any phase, discarding everything.
    pub fn cancel(&mut self) {
        self.phase = PollPhase::Idle;
        self.last_results = None;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, PollPhase::Active(_))
    }

    /// Derived snapshot view; `None` when no poll was ever held.
    pub fn view(&self) -> Option<PollStateView> {
        match &self.phase {
            PollPhase::Active(poll) | PollPhase::Ended(poll) => Some(PollStateView {
                question: Some(poll.question.clone()),
                poll_type: Some(poll.kind.wire_name().to_string()),
                status: Some(
                    if matches!(self.phase, PollPhase::Active(_)) {
                        STATUS_ACTIVE
                    } else {
                        STATUS_ENDED
                    }
                    .to_string(),
                ),
                results: poll.tallies.clone(),
                total_votes: poll.total_votes(),
                last_results: self.last_results.clone(),
                options: poll.kind.options().map(<[String]>::to_vec),
                votes_per_participant: Some(poll.kind.votes_per_participant()),
            }),
            PollPhase::Closed => self.last_results.as_ref().map(|last| PollStateView {
                question: None,
                poll_type: None,
                status: Some(STATUS_CLOSED.to_string()),
                results: BTreeMap::new(),
                total_votes: 0,
                last_results: Some(last.clone()),
                options: None,
                votes_per_participant: None,
            }),
            PollPhase::Idle => self.last_results.as_ref().map(|last| PollStateView {
                question: None,
                poll_type: None,
                status: None,
                results: BTreeMap::new(),
                total_votes: 0,
                last_results: Some(last.clone()),
                options: None,
                votes_per_participant: None,
            }),
        }
    }

    /// Invariant check used by tests: the tally sum equals the summed ballot
    /// sizes of the live poll.
    #[cfg(test)]
    fn accounting_holds(&self) -> bool {
        match &self.phase {
            PollPhase::Active(poll) | PollPhase::Ended(poll) => {
                poll.total_votes() as usize == poll.ballot_total()
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid() -> Uuid {
        Uuid::new_v4()
    }

    fn multi(options: &[&str], votes: u32) -> PollKind {
        PollKind::Multiselect {
            options: options.iter().map(|s| s.to_string()).collect(),
            multiple: true,
            votes_per_participant: votes,
        }
    }

    #[test]
    fn yes_no_lifecycle_captures_results() {
        let mut cell = PollCell::default();
        cell.start("Proceed?".to_string(), PollKind::YesNo);

        let voters: Vec<Uuid> = (0..4).map(|_| sid()).collect();
        assert!(cell.cast(voters[0], "YES"));
        assert!(cell.cast(voters[1], "YES"));
        assert!(cell.cast(voters[2], "YES"));
        assert!(cell.cast(voters[3], "NO"));
        assert!(cell.accounting_holds());

        cell.end();
        let view = cell.view().unwrap();
        assert_eq!(view.status.as_deref(), Some(STATUS_ENDED));
        let last = view.last_results.unwrap();
        assert_eq!(last.results["YES"], 3);
        assert_eq!(last.results["NO"], 1);
        assert_eq!(last.total_votes, 4);

        cell.close();
        let view = cell.view().unwrap();
        assert_eq!(view.status.as_deref(), Some(STATUS_CLOSED));
        assert!(view.question.is_none());
        assert!(view.results.is_empty());
        assert_eq!(view.last_results.unwrap().total_votes, 4);
    }

    #[test]
    fn vote_change_replaces_the_previous_ballot() {
        let mut cell = PollCell::default();
        cell.start("Proceed?".to_string(), PollKind::YesNo);
        let x = sid();
        assert!(cell.cast(x, "YES"));
        assert!(cell.cast(x, "NO"));
        let view = cell.view().unwrap();
        assert_eq!(view.results["YES"], 0);
        assert_eq!(view.results["NO"], 1);
        assert_eq!(view.total_votes, 1);
        assert!(cell.accounting_holds());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut cell = PollCell::default();
        cell.start("Proceed?".to_string(), PollKind::YesNo);
        assert!(!cell.cast(sid(), "MAYBE"));
        assert!(!cell.cast(sid(), "OPT_1"));
        assert_eq!(cell.view().unwrap().total_votes, 0);
    }

    #[test]
    fn votes_outside_active_are_rejected() {
        let mut cell = PollCell::default();
        assert!(!cell.cast(sid(), "YES"));
        cell.start("Proceed?".to_string(), PollKind::YesNo);
        cell.end();
        assert!(!cell.cast(sid(), "YES"));
    }

    #[test]
    fn multiple_selection_caps_and_toggles() {
        let mut cell = PollCell::default();
        cell.start("Pick two".to_string(), multi(&["a", "b", "c"], 2));
        let x = sid();

        assert!(cell.cast(x, "OPT_0"));
        assert!(cell.cast(x, "OPT_1"));
        // Cap reached: third distinct option is rejected.
        assert!(!cell.cast(x, "OPT_2"));
        // Toggle one off, then the third is accepted.
        assert!(cell.cast(x, "OPT_0"));
        assert!(cell.cast(x, "OPT_2"));

        let view = cell.view().unwrap();
        assert_eq!(view.results["OPT_0"], 0);
        assert_eq!(view.results["OPT_1"], 1);
        assert_eq!(view.results["OPT_2"], 1);
        assert_eq!(view.total_votes, 2);
        assert!(cell.accounting_holds());
    }

    #[test]
    fn gradients_have_eight_fixed_levels() {
        let mut cell = PollCell::default();
        cell.start("Agree?".to_string(), PollKind::Gradients);
        let view = cell.view().unwrap();
        assert_eq!(view.results.len(), GRADIENT_LEVELS);
        assert!(view.results.contains_key("OPT_1"));
        assert!(view.results.contains_key("OPT_8"));
        assert!(!view.results.contains_key("OPT_0"));
        assert!(cell.cast(sid(), "OPT_5"));
    }

    #[test]
    fn illegal_transitions_are_silent() {
        let mut cell = PollCell::default();
        // end/close with nothing running: nothing happens.
        cell.end();
        cell.close();
        assert!(cell.view().is_none());

        cell.start("Q".to_string(), PollKind::YesNo);
        // close before end: still active.
        cell.close();
        assert_eq!(cell.view().unwrap().status.as_deref(), Some(STATUS_ACTIVE));
        // double end: stays ended with the same results.
        cell.end();
        cell.end();
        assert_eq!(cell.view().unwrap().status.as_deref(), Some(STATUS_ENDED));
    }

    #[test]
    fn cancel_discards_everything() {
        let mut cell = PollCell::default();
        cell.start("Q".to_string(), PollKind::YesNo);
        cell.cast(sid(), "YES");
        cell.end();
        assert!(cell.view().unwrap().last_results.is_some());
        cell.cancel();
        assert!(cell.view().is_none());
    }

    #[test]
    fn last_results_survive_a_new_start_until_it_ends() {
        let mut cell = PollCell::default();
        cell.start("First".to_string(), PollKind::YesNo);
        cell.cast(sid(), "YES");
        cell.end();
        cell.close();

        cell.start("Second".to_string(), PollKind::YesNo);
        let view = cell.view().unwrap();
        assert_eq!(view.question.as_deref(), Some("Second"));
        assert_eq!(view.last_results.as_ref().unwrap().question, "First");

        cell.cast(sid(), "NO");
        cell.end();
        let view = cell.view().unwrap();
        assert_eq!(view.last_results.as_ref().unwrap().question, "Second");
    }

    #[test]
    fn cancel_after_restart_discards_earlier_history_too() {
        let mut cell = PollCell::default();
        assert!(cell.view().is_none());
        cell.start("Q".to_string(), PollKind::YesNo);
        cell.end();
        // A started-then-cancelled successor keeps nothing, not even the
        // results of the poll before it.
        cell.start("Q2".to_string(), PollKind::YesNo);
        cell.cancel();
        assert!(cell.view().is_none());
    }
}
