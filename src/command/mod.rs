//! Command lifecycle contract and the cooperative scheduler that drives it.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──(schedule)──► Active ──(is_finished / interrupt)──► Ended ──► Idle
//!                       │  ▲
//!                       └──┘ on_tick once per cycle
//! ```

pub mod scheduler;

pub use scheduler::{BindingKind, CommandId, CommandPhase, CommandScheduler, SchedulerError};

use std::fmt::{self, Display};

/// Hardware resources a command can claim. Two commands sharing a requirement
/// never run in the same cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    Shooter,
    Hood,
    Indexer,
}

impl Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Shooter => write!(f, "Shooter"),
            Requirement::Hood => write!(f, "Hood"),
            Requirement::Indexer => write!(f, "Indexer"),
        }
    }
}

/// Trait for commands run by the [`CommandScheduler`]
///
/// Hooks are called synchronously from the robot loop and must not block.
pub trait Command {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Subsystems this command needs exclusive use of
    fn requirements(&self) -> &[Requirement];

    /// Called once when the command becomes active
    fn on_start(&mut self) {}

    /// Called once per control cycle while active
    fn on_tick(&mut self) {}

    /// Called once when the command leaves the active state.
    ///
    /// `interrupted` is true when the scheduler cancelled the command; in that
    /// case `on_tick` may not have run in the current cycle.
    fn on_end(&mut self, interrupted: bool) {
        let _ = interrupted;
    }

    /// Polled after every tick
    fn is_finished(&self) -> bool {
        false
    }
}
