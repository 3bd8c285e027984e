//! Structured records of what the pass did and why it declined.
//!
//! Every conversion, peephole rewrite, and veto is recorded as an [`Event`].
//! Passes accumulate into a local [`EventLog`] and merge it into the shared
//! context log at the end, so parallel function processing never interleaves
//! half-built records.

use std::sync::Mutex;

use crate::ir::BlockId;

/// What kind of thing happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumCount)]
pub enum EventKind {
    /// A conditional branch was replaced by a select.
    BranchConverted,
    /// A select was rewritten into ordinary arithmetic.
    PeepholeApplied,
    /// A candidate was rejected by the execution-cost gate.
    CostVetoed,
    /// A candidate was rejected because its head sits inside a loop.
    LoopVetoed,
    /// A candidate was rejected because the target cannot lower the select.
    LoweringVetoed,
}

/// One record in the event log.
#[derive(Debug, Clone)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// The block the event concerns, if any.
    pub block: Option<BlockId>,
    /// Human-readable detail.
    pub message: String,
}

/// An append-only log of [`Event`]s, shareable across worker threads.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording an event of the given kind. The event is appended to
    /// the log when the returned recorder is dropped.
    pub fn record(&self, kind: EventKind) -> EventRecorder<'_> {
        EventRecorder {
            log: self,
            event: Event {
                kind,
                block: None,
                message: String::new(),
            },
        }
    }

    /// Appends all events of `other` to this log.
    pub fn merge(&self, other: EventLog) {
        let moved = other.into_events();
        self.lock().extend(moved);
    }

    /// Returns a copy of all recorded events in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Consumes the log, returning its events.
    #[must_use]
    pub fn into_events(self) -> Vec<Event> {
        self.events
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns how many events of the given kind have been recorded.
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().iter().filter(|e| e.kind == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Builder returned by [`EventLog::record`]. Pushes its event when dropped.
#[derive(Debug)]
pub struct EventRecorder<'a> {
    log: &'a EventLog,
    event: Event,
}

impl EventRecorder<'_> {
    /// Attaches the block the event concerns.
    #[must_use]
    pub fn at(mut self, block: BlockId) -> Self {
        self.event.block = Some(block);
        self
    }

    /// Attaches a human-readable message.
    pub fn message(mut self, message: impl Into<String>) {
        self.event.message = message.into();
    }
}

impl Drop for EventRecorder<'_> {
    fn drop(&mut self) {
        let event = Event {
            kind: self.event.kind,
            block: self.event.block,
            message: std::mem::take(&mut self.event.message),
        };
        self.log.lock().push(event);
    }
}
