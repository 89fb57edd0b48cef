//! Turn assembly: deciding when a streamed response is finished.
//!
//! The chat channel has no end-of-turn marker. A response is considered
//! complete once no fragment has arrived for a quiescence window; every new
//! fragment pushes the deadline out again. Uploads do not need this because
//! their stream ends when the response does.
//!
//! The assembler never reads the clock itself. Callers pass `now` in, which
//! keeps the timing rule testable without real sleeps.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// How the assembler decides a turn is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Commit after this much silence.
    Quiescence(Duration),
    /// Commit when the caller says the stream ended.
    Structural,
}

/// Where a turn is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No request outstanding.
    Idle,
    /// Request sent, nothing received yet.
    Awaiting,
    /// Fragments are arriving; `deadline` is when silence commits the turn.
    Streaming { deadline: Option<Instant> },
}

/// Accumulates one live buffer.
#[derive(Debug, Clone)]
pub struct TurnAssembler {
    policy: CompletionPolicy,
    phase: TurnPhase,
    buffer: String,
}

impl TurnAssembler {
    pub fn new(policy: CompletionPolicy) -> Self {
        Self {
            policy,
            phase: TurnPhase::Idle,
            buffer: String::new(),
        }
    }

    /// Assembler for chat turns.
    pub fn quiescent(window: Duration) -> Self {
        Self::new(CompletionPolicy::Quiescence(window))
    }

    /// Assembler for upload summaries.
    pub fn structural() -> Self {
        Self::new(CompletionPolicy::Structural)
    }

    /// Mark a request as sent. Any leftover buffer is dropped.
    pub fn begin(&mut self) {
        if !self.buffer.is_empty() {
            debug!("Discarding {} uncommitted bytes on new turn", self.buffer.len());
        }
        self.buffer.clear();
        self.phase = TurnPhase::Awaiting;
    }

    /// Append a fragment received at `now` and restart the quiescence timer.
    pub fn push_fragment(&mut self, text: &str, now: Instant) {
        self.buffer.push_str(text);
        let deadline = match self.policy {
            CompletionPolicy::Quiescence(window) => Some(now + window),
            CompletionPolicy::Structural => None,
        };
        self.phase = TurnPhase::Streaming { deadline };
    }

    /// When the buffer will commit if nothing else arrives.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            TurnPhase::Streaming { deadline } => deadline,
            _ => None,
        }
    }

    /// Commit the buffer if its deadline has passed.
    ///
    /// Returns the finished text. An empty buffer is never committed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.finish(),
            _ => None,
        }
    }

    /// Commit unconditionally (end of stream). Returns `None` for an empty buffer.
    pub fn finish(&mut self) -> Option<String> {
        self.phase = TurnPhase::Idle;
        if self.buffer.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.buffer))
    }

    /// Throw away the buffer without committing.
    pub fn discard(&mut self) {
        self.buffer.clear();
        self.phase = TurnPhase::Idle;
    }

    /// The not-yet-committed text.
    pub fn live_text(&self) -> &str {
        &self.buffer
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// True between `begin` and the first fragment.
    pub fn is_awaiting(&self) -> bool {
        self.phase == TurnPhase::Awaiting
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TurnPhase::Idle
    }
}

/// Which transport a live buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOrigin {
    Chat,
    Upload,
}

/// The one live buffer the client may hold at a time.
#[derive(Debug, Clone)]
pub struct LiveTurn {
    pub origin: TurnOrigin,
    pub assembler: TurnAssembler,
}

impl LiveTurn {
    pub fn chat(window: Duration) -> Self {
        let mut assembler = TurnAssembler::quiescent(window);
        assembler.begin();
        Self {
            origin: TurnOrigin::Chat,
            assembler,
        }
    }

    pub fn upload() -> Self {
        let mut assembler = TurnAssembler::structural();
        assembler.begin();
        Self {
            origin: TurnOrigin::Upload,
            assembler,
        }
    }
}
