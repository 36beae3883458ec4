use tracing::info;

use crate::command::{Command, Requirement};
use crate::subsystems::{Indexer, Shared};

/// Pushes balls into the shooter every cycle, no readiness check.
pub struct FeedShooter<I: Indexer + ?Sized> {
    indexer: Shared<I>,
}

impl<I: Indexer + ?Sized> FeedShooter<I> {
    pub fn new(indexer: Shared<I>) -> Self {
        Self { indexer }
    }
}

impl<I: Indexer + ?Sized> Command for FeedShooter<I> {
    fn name(&self) -> &str {
        "FeedShooter"
    }

    fn requirements(&self) -> &[Requirement] {
        &[Requirement::Indexer]
    }

    fn on_tick(&mut self) {
        self.indexer.borrow_mut().feed_shooter();
    }

    fn on_end(&mut self, interrupted: bool) {
        info!("FeedShooter ended (interrupted: {}), back to indexing", interrupted);
        self.indexer.borrow_mut().index_balls();
    }

    fn is_finished(&self) -> bool {
        false
    }
}
