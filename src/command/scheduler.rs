//! Cooperative command scheduler.
//!
//! Runs once per control cycle from the robot loop:
//!
//! 1. `periodic()` on every registered subsystem
//! 2. poll trigger bindings, start/interrupt commands on edges
//! 3. `on_tick()` every active command, end the ones that report finished
//! 4. start default commands on subsystems nobody else claims
//!
//! Edge state is stored per trigger *instance* ([`TriggerKey`]). Each trigger is
//! sampled at most once per cycle no matter how many bindings share it.

use std::collections::HashMap;
use std::fmt::{self, Display};
use tracing::{debug, info, warn};

use crate::command::{Command, Requirement};
use crate::controller::{Trigger, TriggerKey};
use crate::subsystems::{Shared, Subsystem};

/// Handle to a command registered with one scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(usize);

impl Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Start on the rising edge, run until finished or interrupted
    OnTrue,
    /// Start on the rising edge, interrupt on the falling edge
    WhileTrue,
    /// Rising edge starts the command if idle, interrupts it if running
    ToggleOnTrue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    Idle,
    Active,
    Ended,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Unknown command id: {0}")]
    UnknownCommand(CommandId),

    #[error("Default command {command} does not require {requirement}")]
    DefaultMissingRequirement {
        command: String,
        requirement: Requirement,
    },
}

struct Slot {
    command: Box<dyn Command>,
    phase: CommandPhase,
}

struct Binding {
    trigger: Trigger,
    kind: BindingKind,
    command: CommandId,
}

enum Action {
    Schedule(CommandId),
    Cancel(CommandId),
    Toggle(CommandId),
}

#[derive(Default)]
pub struct CommandScheduler {
    slots: Vec<Slot>,
    bindings: Vec<Binding>,
    levels: HashMap<TriggerKey, bool>,
    running: Vec<CommandId>,
    defaults: Vec<(Requirement, CommandId)>,
    subsystems: Vec<Shared<dyn Subsystem>>,
    cycle: u64,
}

impl CommandScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: impl Command + 'static) -> CommandId {
        let id = CommandId(self.slots.len());
        debug!("Registering command {} as {}", command.name(), id);
        self.slots.push(Slot {
            command: Box::new(command),
            phase: CommandPhase::Idle,
        });
        id
    }

    /// Subsystems registered here get `periodic()` at the start of every cycle
    pub fn register_subsystem(&mut self, subsystem: Shared<dyn Subsystem>) {
        debug!(
            "Registering subsystem {}",
            subsystem.borrow().requirement()
        );
        self.subsystems.push(subsystem);
    }

    pub fn bind(
        &mut self,
        trigger: &Trigger,
        kind: BindingKind,
        command: CommandId,
    ) -> Result<(), SchedulerError> {
        let name = self.slot(command)?.command.name().to_string();
        info!("Binding {} to {:?} ({:?})", name, trigger.label(), kind);

        // Seed with the current level so a button held at startup is not an edge
        let key = trigger.key();
        let level = trigger.get();
        self.levels.entry(key).or_insert(level);

        self.bindings.push(Binding {
            trigger: trigger.clone(),
            kind,
            command,
        });
        Ok(())
    }

    pub fn on_true(&mut self, trigger: &Trigger, command: CommandId) -> Result<(), SchedulerError> {
        self.bind(trigger, BindingKind::OnTrue, command)
    }

    pub fn while_true(
        &mut self,
        trigger: &Trigger,
        command: CommandId,
    ) -> Result<(), SchedulerError> {
        self.bind(trigger, BindingKind::WhileTrue, command)
    }

    pub fn toggle_on_true(
        &mut self,
        trigger: &Trigger,
        command: CommandId,
    ) -> Result<(), SchedulerError> {
        self.bind(trigger, BindingKind::ToggleOnTrue, command)
    }

    /// Command that runs whenever nothing else claims `requirement`
    pub fn set_default_command(
        &mut self,
        requirement: Requirement,
        command: CommandId,
    ) -> Result<(), SchedulerError> {
        let slot = self.slot(command)?;
        if !slot.command.requirements().contains(&requirement) {
            return Err(SchedulerError::DefaultMissingRequirement {
                command: slot.command.name().to_string(),
                requirement,
            });
        }
        info!(
            "Default command for {} is {}",
            requirement,
            slot.command.name()
        );
        self.defaults.retain(|(existing, _)| *existing != requirement);
        self.defaults.push((requirement, command));
        Ok(())
    }

    /// Starts a command, interrupting every running command that shares a
    /// requirement with it. Scheduling a running command does nothing.
    pub fn schedule(&mut self, command: CommandId) -> Result<(), SchedulerError> {
        self.slot(command)?;
        if self.is_running(command) {
            debug!("Command {} already running", command);
            return Ok(());
        }

        let requirements = self.slots[command.0].command.requirements().to_vec();
        let conflicting: Vec<CommandId> = self
            .running
            .iter()
            .copied()
            .filter(|other| {
                self.slots[other.0]
                    .command
                    .requirements()
                    .iter()
                    .any(|requirement| requirements.contains(requirement))
            })
            .collect();
        for other in conflicting {
            self.end(other, true);
        }

        let slot = &mut self.slots[command.0];
        info!("Starting command {}", slot.command.name());
        slot.command.on_start();
        slot.phase = CommandPhase::Active;
        self.running.push(command);
        Ok(())
    }

    /// Interrupts a running command; idle commands are left alone
    pub fn cancel(&mut self, command: CommandId) -> Result<(), SchedulerError> {
        self.slot(command)?;
        if self.is_running(command) {
            self.end(command, true);
        }
        Ok(())
    }

    pub fn cancel_all(&mut self) {
        for command in self.running.clone() {
            self.end(command, true);
        }
    }

    pub fn is_running(&self, command: CommandId) -> bool {
        self.running.contains(&command)
    }

    pub fn phase(&self, command: CommandId) -> Option<CommandPhase> {
        self.slots.get(command.0).map(|slot| slot.phase)
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    /// Number of completed `run` calls
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// One control cycle
    pub fn run(&mut self) {
        for subsystem in &self.subsystems {
            subsystem.borrow_mut().periodic();
        }

        self.poll_bindings();

        for command in self.running.clone() {
            let slot = &mut self.slots[command.0];
            slot.command.on_tick();
            if slot.command.is_finished() {
                self.end(command, false);
            }
        }

        self.schedule_defaults();
        self.cycle += 1;
    }

    fn poll_bindings(&mut self) {
        let mut current: HashMap<TriggerKey, bool> = HashMap::with_capacity(self.levels.len());
        let mut actions = Vec::new();

        for binding in &self.bindings {
            let key = binding.trigger.key();
            let now = *current.entry(key).or_insert_with(|| binding.trigger.get());
            let before = self.levels.get(&key).copied().unwrap_or(false);

            match (binding.kind, before, now) {
                (BindingKind::OnTrue, false, true) | (BindingKind::WhileTrue, false, true) => {
                    debug!("Rising edge on {}", binding.trigger.label());
                    actions.push(Action::Schedule(binding.command));
                }
                (BindingKind::WhileTrue, true, false) => {
                    debug!("Falling edge on {}", binding.trigger.label());
                    actions.push(Action::Cancel(binding.command));
                }
                (BindingKind::ToggleOnTrue, false, true) => {
                    actions.push(Action::Toggle(binding.command));
                }
                _ => {}
            }
        }
        self.levels = current;

        for action in actions {
            match action {
                Action::Schedule(command) => self.start_bound(command),
                Action::Cancel(command) => {
                    if self.is_running(command) {
                        self.end(command, true);
                    }
                }
                Action::Toggle(command) => {
                    if self.is_running(command) {
                        self.end(command, true);
                    } else {
                        self.start_bound(command);
                    }
                }
            }
        }
    }

    fn schedule_defaults(&mut self) {
        for (requirement, command) in self.defaults.clone() {
            if self.is_running(command) || self.is_claimed(requirement) {
                continue;
            }
            self.start_bound(command);
        }
    }

    fn is_claimed(&self, requirement: Requirement) -> bool {
        self.running.iter().any(|command| {
            self.slots[command.0]
                .command
                .requirements()
                .contains(&requirement)
        })
    }

    // Ids stored in bindings and defaults were validated when they were added
    fn start_bound(&mut self, command: CommandId) {
        if let Err(e) = self.schedule(command) {
            warn!("Failed to schedule bound command: {}", e);
        }
    }

    fn end(&mut self, command: CommandId, interrupted: bool) {
        let slot = &mut self.slots[command.0];
        if interrupted {
            info!("Interrupting command {}", slot.command.name());
        } else {
            info!("Command {} finished", slot.command.name());
        }
        slot.command.on_end(interrupted);
        slot.phase = CommandPhase::Ended;
        self.running.retain(|running| *running != command);
    }

    fn slot(&self, command: CommandId) -> Result<&Slot, SchedulerError> {
        self.slots
            .get(command.0)
            .ok_or(SchedulerError::UnknownCommand(command))
    }
}
