//! Events emitted while stepping a controller.
//!
//! Events carry state-machine activity and recoverable diagnostics. Hosts drain them after
//! `update()`; nothing in here can fail the frame.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GraphError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[non_exhaustive]
pub enum ControllerEvent {
    StateEntered {
        state: String,
    },
    TransitionStarted {
        /// None when leaving START.
        from: Option<String>,
        to: String,
        duration: f32,
    },
    TransitionFinished {
        state: String,
    },
    /// Recoverable per-frame problem (missing parameter, degenerate blend).
    Diagnostic {
        error: GraphError,
    },
}

/// Bounded event queue. Events accumulate across updates until drained.
#[derive(Clone, Debug)]
pub struct EventQueue {
    events: Vec<ControllerEvent>,
    cap: usize,
    dropped: u64,
    /// Set after the first overflow since the last drain.
    overflowed: bool,
}

impl EventQueue {
    pub fn new(cap: usize) -> Self {
        Self {
            events: Vec::new(),
            cap,
            dropped: 0,
            overflowed: false,
        }
    }

    #[inline]
    pub fn push(&mut self, event: ControllerEvent) {
        if self.events.len() < self.cap {
            self.events.push(event);
        } else {
            if !self.overflowed {
                warn!(cap = self.cap, "event queue full; dropping events until drained");
                self.overflowed = true;
            }
            self.dropped += 1;
        }
    }

    /// Log and queue a recoverable error.
    pub fn diagnostic(&mut self, error: GraphError) {
        warn!(category = error.category(), "{error}");
        self.push(ControllerEvent::Diagnostic { error });
    }

    #[inline]
    pub fn events(&self) -> &[ControllerEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<ControllerEvent> {
        self.overflowed = false;
        std::mem::take(&mut self.events)
    }

    /// Events discarded because the queue was full.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
