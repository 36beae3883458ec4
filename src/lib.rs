//! Driver input bindings and shooting commands for a periodically scheduled
//! robot program.
//!
//! - [`controller`] - gamepad collection and memoized [`controller::Trigger`]s
//! - [`command`] - command lifecycle and the cooperative scheduler
//! - [`commands`] - gated shooting and feeding commands
//! - [`subsystems`] - shooter, hood and indexer interfaces plus simulations
//! - [`robot_container`] - button to command bindings

pub mod command;
pub mod commands;
pub mod config;
pub mod controller;
pub mod robot_container;
pub mod subsystems;
