//! In-process chain doubles for tests and ephemeral runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use arbor_types::{BlockNumber, FieldElement};

use crate::error::{ChainError, ChainResult};
use crate::event::CommitmentEvent;
use crate::source::EventSource;
use crate::submitter::{RootSubmitter, SubmitReceipt};

#[derive(Default)]
struct ChainState {
    head: BlockNumber,
    events: Vec<CommitmentEvent>,
    failures: VecDeque<ChainError>,
}

/// Event source over a scripted list of events.
///
/// Queued failures are returned by the next calls, one per call.
#[derive(Default)]
pub struct MemoryEventSource {
    state: Mutex<ChainState>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event and move the head up to its block if needed.
    pub fn push(&self, event: CommitmentEvent) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.head = state.head.max(event.block);
        state.events.push(event);
    }

    pub fn set_head(&self, head: BlockNumber) {
        self.state.lock().expect("lock poisoned").head = head;
    }

    pub fn fail_next(&self, error: ChainError) {
        self.state.lock().expect("lock poisoned").failures.push_back(error);
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn latest_block(&self) -> ChainResult<BlockNumber> {
        let mut state = self.state.lock().expect("lock poisoned");
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state.head),
        }
    }

    async fn fetch(&self, from: BlockNumber, to: BlockNumber) -> ChainResult<Vec<CommitmentEvent>> {
        let mut state = self.state.lock().expect("lock poisoned");
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        let mut events: Vec<CommitmentEvent> = state
            .events
            .iter()
            .filter(|e| e.block >= from && e.block <= to)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.block);
        Ok(events)
    }
}

#[derive(Default)]
struct SubmitterState {
    submitted: Vec<FieldElement>,
    reject: Vec<FieldElement>,
    failures: VecDeque<ChainError>,
}

/// Submitter that records accepted roots instead of sending them.
#[derive(Default)]
pub struct MemorySubmitter {
    state: Mutex<SubmitterState>,
}

impl MemorySubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<FieldElement> {
        self.state.lock().expect("lock poisoned").submitted.clone()
    }

    /// Reject every submission of `root` until [`accept`](Self::accept).
    pub fn reject(&self, root: FieldElement) {
        self.state.lock().expect("lock poisoned").reject.push(root);
    }

    pub fn accept(&self, root: &FieldElement) {
        self.state.lock().expect("lock poisoned").reject.retain(|r| r != root);
    }

    pub fn fail_next(&self, error: ChainError) {
        self.state.lock().expect("lock poisoned").failures.push_back(error);
    }
}

#[async_trait]
impl RootSubmitter for MemorySubmitter {
    async fn submit(&self, root: &FieldElement) -> ChainResult<SubmitReceipt> {
        let mut state = self.state.lock().expect("lock poisoned");
        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }
        if state.reject.contains(root) {
            return Err(ChainError::Api {
                status: 500,
                message: format!("root {root} reverted"),
            });
        }
        state.submitted.push(*root);
        Ok(SubmitReceipt {
            tx_hash: Some(format!("0x{:x}", state.submitted.len())),
        })
    }
}
