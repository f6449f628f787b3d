//! Terminal program seam.
//!
//! The orchestrator only needs three things from the interactive UI: a way to
//! inject messages, a blocking run loop, and an idempotent terminal release.
//! [`viewer::Viewer`] is the bundled implementation.

pub mod viewer;

use crate::delivery::{DeliverySender, Message};
use crate::error::ProgramError;
use crate::shutdown::CleanupLatch;

/// Cloneable handle for talking to a running program from other tasks.
#[derive(Debug, Clone)]
pub struct ProgramHandle {
    delivery: DeliverySender,
}

impl ProgramHandle {
    pub fn new(delivery: DeliverySender) -> Self {
        Self { delivery }
    }

    /// Queue a message for the run loop. `false` once the program is gone.
    pub fn inject(&self, message: Message) -> bool {
        self.delivery.send(message)
    }

    /// Ask the run loop to exit.
    pub fn quit(&self) {
        self.delivery.send(Message::Quit);
    }

    /// Producer half for tasks that feed the program directly.
    pub fn sender(&self) -> DeliverySender {
        self.delivery.clone()
    }
}

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The user pressed a quit key.
    UserQuit,
    /// A [`Message::Quit`] arrived.
    QuitRequested,
    /// Terminal state was released underneath the loop (signal path).
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: ExitReason,
    /// Messages applied before exit.
    pub messages: usize,
}

/// An interactive UI driven by the orchestrator.
pub trait TerminalProgram {
    /// Handle for injecting messages and requesting quit.
    fn handle(&self) -> ProgramHandle;

    /// Guarded terminal release. Shared with the shutdown path; running it
    /// more than once has no further effect.
    fn cleanup(&self) -> CleanupLatch;

    /// Block the calling thread until the program exits.
    fn run(&mut self) -> Result<RunSummary, ProgramError>;
}
