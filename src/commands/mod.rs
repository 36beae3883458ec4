//! Shooting and feeding commands.
//!
//! Every command here issues its setpoints each tick, reads feedback after the
//! setpoints, and gates the feed on readiness evaluated fresh every cycle.
//! None of them finish on their own: they run until the scheduler interrupts
//! them, and `on_end` leaves the mechanisms in a safe state from any point of
//! the tick sequence.
//!
//! | Command | Requires | Feeds when | On end |
//! |---|---|---|---|
//! | [`FeedShooter`] | indexer | always | indexer back to indexing |
//! | [`ShootAtVelocity`] | shooter, indexer | `9700 < v < 10500` | nothing |
//! | [`ShootAtTarmac`] | shooter, hood, indexer | shooter and hood ready | stop shooter, hood default |
//! | [`ShootAuto`] | shooter, hood | never | stop shooter, hood zero |
//! | [`ShooterRunAtCloseVelocity`] | shooter | never | stop shooter |
//! | [`HoodReturnToDefault`] | hood | never | nothing |

pub mod indexer;
pub mod shooter;

#[cfg(test)]
pub(crate) mod testing;

pub use indexer::FeedShooter;
pub use shooter::{
    AcceptanceWindow, HoodReturnToDefault, ShootAtTarmac, ShootAtVelocity, ShootAuto,
    ShooterRunAtCloseVelocity, CLOSE_SHOT_BAND, CLOSE_SHOT_WINDOW,
};
