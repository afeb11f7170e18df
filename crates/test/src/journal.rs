//! A shared, ordered record of everything a node under test did
//! through its collaborators: what it stored, published and decided.

use std::sync::{Arc, Mutex, PoisonError};

use chronobft_core_types::Round;
use chronobft_engine::network::SignedConsensusMsg;
use chronobft_engine::store::PersistedState;

use crate::{Height, Proposal, TestContext, Value, Vote};

#[derive(Clone, Debug)]
pub enum Entry {
    Persisted(PersistedState<TestContext>),
    Published(SignedConsensusMsg<TestContext>),
    Decided(Height, Round, Value),
}

#[derive(Clone, Debug, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: Entry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn published_proposals(&self) -> Vec<Proposal> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Published(SignedConsensusMsg::Proposal(proposal)) => {
                    Some(proposal.message)
                }
                _ => None,
            })
            .collect()
    }

    pub fn published_votes(&self) -> Vec<Vote> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Published(SignedConsensusMsg::Vote(vote)) => Some(vote.message),
                _ => None,
            })
            .collect()
    }

    pub fn decisions(&self) -> Vec<(Height, Round, Value)> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Decided(height, round, value) => Some((height, round, value)),
                _ => None,
            })
            .collect()
    }
}
