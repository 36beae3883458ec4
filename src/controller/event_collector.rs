use chrono::Local;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::controller::controller_handle::{ControllerState, XboxAxis, XboxButton};

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub gamepad_index: usize,
    pub poll_interval_ms: u64,
    pub joystick_deadzone: f32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            gamepad_index: 0,
            poll_interval_ms: 5,
            joystick_deadzone: 0.05,
        }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to spawn collector thread: {0}")]
    SpawnError(String),
}

/// One change to the published controller state
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Button(XboxButton, bool),
    Axis(XboxAxis, f64),
    Pov(Option<u16>),
    Neutral,
}

impl StateUpdate {
    pub fn apply(&self, state: &mut ControllerState) {
        match self {
            StateUpdate::Button(button, pressed) => state.set_button(*button, *pressed),
            StateUpdate::Axis(axis, value) => state.set_axis(*axis, *value),
            StateUpdate::Pov(angle) => state.pov = *angle,
            StateUpdate::Neutral => state.neutral(),
        }
    }
}

// D-pad buttons arrive one by one, the switch angle is derived from all four
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DpadState {
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,
}

impl DpadState {
    /// Angle clockwise from up, `None` when centered or when opposite
    /// directions cancel out completely
    pub fn angle(&self) -> Option<u16> {
        let vertical = self.up as i8 - self.down as i8;
        let horizontal = self.right as i8 - self.left as i8;
        match (vertical, horizontal) {
            (1, 0) => Some(0),
            (1, 1) => Some(45),
            (0, 1) => Some(90),
            (-1, 1) => Some(135),
            (-1, 0) => Some(180),
            (-1, -1) => Some(225),
            (0, -1) => Some(270),
            (1, -1) => Some(315),
            _ => None,
        }
    }

    fn set(&mut self, button: Button, pressed: bool) -> bool {
        match button {
            Button::DPadUp => self.up = pressed,
            Button::DPadRight => self.right = pressed,
            Button::DPadDown => self.down = pressed,
            Button::DPadLeft => self.left = pressed,
            _ => return false,
        }
        true
    }
}

/// Connection-relevant part of a gilrs event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Connected,
    Disconnected,
    Input,
}

impl Presence {
    pub fn of(event: &EventType) -> Self {
        match event {
            EventType::Connected => Presence::Connected,
            EventType::Disconnected => Presence::Disconnected,
            _ => Presence::Input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRoute<Id> {
    /// Event belongs to the followed gamepad
    Handle,
    /// Start following this gamepad, then handle the event
    Adopt(Id),
    /// Followed gamepad is gone: handle the event, then follow nothing
    Release,
    Skip,
}

/// Decides what the collector does with an event from gamepad `id` while it
/// follows `active`. With nothing followed, the first gamepad that connects or
/// sends input is adopted.
pub fn route_event<Id: Copy + PartialEq>(
    active: Option<Id>,
    id: Id,
    presence: Presence,
) -> EventRoute<Id> {
    match (active, presence) {
        (Some(active_id), _) if active_id != id => EventRoute::Skip,
        (Some(_), Presence::Disconnected) => EventRoute::Release,
        (Some(_), _) => EventRoute::Handle,
        (None, Presence::Disconnected) => EventRoute::Skip,
        (None, _) => EventRoute::Adopt(id),
    }
}

// Define collector states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context
    gilrs: Gilrs,

    // Active gamepad
    active_gamepad: Option<GamepadId>,

    // Collector settings
    settings: CollectorSettings,

    // Latest state for the robot loop
    state_sender: watch::Sender<ControllerState>,

    dpad: DpadState,
}

impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        state_sender: watch::Sender<ControllerState>,
    ) -> Result<Self, CollectorError> {
        let settings = settings.unwrap_or_default();
        debug!("Creating Event Collector with settings: {:?}", settings);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(
            gilrs,
            None,
            settings,
            state_sender,
            DpadState::default(),
        ))
    }

    // Select the configured gamepad and transition to Collecting state
    pub fn initialize(mut self) -> EventCollector<Collecting> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, waiting for the first one to appear");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
                info!("  [{}] ID: {}, Name: {}", idx, id, gamepad.name());
            }

            let index = if self.settings.gamepad_index < gamepads.len() {
                self.settings.gamepad_index
            } else {
                warn!(
                    "Gamepad index {} out of range, falling back to the first gamepad",
                    self.settings.gamepad_index
                );
                0
            };
            let (id, gamepad) = &gamepads[index];
            self.active_gamepad = Some(*id);
            info!("Selected gamepad: {} ({})", gamepad.name(), id);
        }

        info!(
            "Event Collector initialized with deadzone {}, transitioning to Collecting state",
            self.settings.joystick_deadzone
        );
        self.transition()
    }
}

impl EventCollector<Collecting> {
    // Drain everything gilrs has queued and publish the resulting state
    pub fn collect_pending_events(&mut self) -> usize {
        let mut handled = 0;

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match route_event(self.active_gamepad, id, Presence::of(&event)) {
                EventRoute::Skip => {
                    debug!("Skipping event from non-active gamepad: {:?}", id);
                    continue;
                }
                EventRoute::Adopt(new_id) => {
                    info!("Following gamepad {}", new_id);
                    self.active_gamepad = Some(new_id);
                }
                EventRoute::Release => {
                    warn!("Active gamepad {} disconnected, waiting for another", id);
                    self.active_gamepad = None;
                }
                EventRoute::Handle => {}
            }

            if let Some(update) = self.convert_gilrs_event(event) {
                debug!("Publishing controller update: {:?}", update);
                self.state_sender.send_modify(|state| update.apply(state));
                handled += 1;
            }
        }

        handled
    }

    // Run until the shutdown token is cancelled
    pub fn run_collection_loop(&mut self, shutdown: &CancellationToken) {
        info!("Starting Event Collector loop");

        let mut event_count = 0usize;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(10);
        let poll_interval = Duration::from_millis(self.settings.poll_interval_ms);

        while !shutdown.is_cancelled() {
            event_count += self.collect_pending_events();

            let now = Local::now();
            if now - last_log_time > log_interval {
                debug!(
                    "Event Collector stats: {} events in last {} seconds",
                    event_count,
                    log_interval.num_seconds()
                );
                event_count = 0;
                last_log_time = now;
            }

            thread::sleep(poll_interval);
        }

        // Leave the robot loop with released inputs, not whatever was held last
        self.state_sender.send_modify(ControllerState::neutral);
        info!("Event Collector loop stopped");
    }

    fn convert_gilrs_event(&mut self, event: EventType) -> Option<StateUpdate> {
        match event {
            EventType::AxisChanged(axis, value, _) => {
                let deadzone = self.settings.joystick_deadzone;
                match axis {
                    Axis::LeftStickX => Some(StateUpdate::Axis(
                        XboxAxis::LeftX,
                        apply_deadzone(value, deadzone) as f64,
                    )),
                    // gilrs reports up as positive, the HID convention is up negative
                    Axis::LeftStickY => Some(StateUpdate::Axis(
                        XboxAxis::LeftY,
                        -apply_deadzone(value, deadzone) as f64,
                    )),
                    Axis::RightStickX => Some(StateUpdate::Axis(
                        XboxAxis::RightX,
                        apply_deadzone(value, deadzone) as f64,
                    )),
                    Axis::RightStickY => Some(StateUpdate::Axis(
                        XboxAxis::RightY,
                        -apply_deadzone(value, deadzone) as f64,
                    )),
                    Axis::LeftZ => Some(StateUpdate::Axis(
                        XboxAxis::LeftTrigger,
                        trigger_value(value) as f64,
                    )),
                    Axis::RightZ => Some(StateUpdate::Axis(
                        XboxAxis::RightTrigger,
                        trigger_value(value) as f64,
                    )),
                    _ => {
                        debug!("Ignoring unsupported axis: {:?}", axis);
                        None
                    }
                }
            }
            EventType::ButtonChanged(Button::LeftTrigger2, value, _) => Some(StateUpdate::Axis(
                XboxAxis::LeftTrigger,
                trigger_value(value) as f64,
            )),
            EventType::ButtonChanged(Button::RightTrigger2, value, _) => Some(
                StateUpdate::Axis(XboxAxis::RightTrigger, trigger_value(value) as f64),
            ),
            EventType::ButtonPressed(button, _) => self.button_update(button, true),
            EventType::ButtonReleased(button, _) => self.button_update(button, false),
            EventType::Connected => {
                info!("Controller connected event detected");
                None
            }
            EventType::Disconnected => {
                warn!("Controller disconnected, releasing all inputs");
                self.dpad = DpadState::default();
                Some(StateUpdate::Neutral)
            }
            _ => None,
        }
    }

    fn button_update(&mut self, button: Button, pressed: bool) -> Option<StateUpdate> {
        if self.dpad.set(button, pressed) {
            return Some(StateUpdate::Pov(self.dpad.angle()));
        }
        let mapped = map_button(button);
        if mapped.is_none() {
            debug!("Unmapped button: {:?}", button);
        }
        mapped.map(|button| StateUpdate::Button(button, pressed))
    }
}

// Public interface for spawning and running the collector
pub struct CollectorHandle {
    thread: JoinHandle<()>,
}

impl CollectorHandle {
    // Create a new collector and run it on its own thread
    pub fn spawn(
        settings: Option<CollectorSettings>,
        state_sender: watch::Sender<ControllerState>,
        shutdown: CancellationToken,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let collector = EventCollector::create(settings, state_sender)?;

        let thread = thread::Builder::new()
            .name("gamepad-collector".to_string())
            .spawn(move || {
                let mut collecting = collector.initialize();
                collecting.run_collection_loop(&shutdown);
            })
            .map_err(|e| CollectorError::SpawnError(e.to_string()))?;

        info!("Event Collector successfully started");
        Ok(Self { thread })
    }

    pub fn into_thread(self) -> JoinHandle<()> {
        self.thread
    }
}

// Helper function to map gilrs Button to our XboxButton
pub fn map_button(button: Button) -> Option<XboxButton> {
    match button {
        Button::South => Some(XboxButton::A),
        Button::East => Some(XboxButton::B),
        Button::West => Some(XboxButton::X),
        Button::North => Some(XboxButton::Y),
        Button::Select => Some(XboxButton::Back),
        Button::Start => Some(XboxButton::Start),
        Button::LeftTrigger => Some(XboxButton::LeftBumper),
        Button::RightTrigger => Some(XboxButton::RightBumper),
        Button::LeftThumb => Some(XboxButton::LeftStick),
        Button::RightThumb => Some(XboxButton::RightStick),
        _ => None,
    }
}

// Helper function to apply deadzone to analog stick values
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() <= deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

// Some backends report triggers in [-1, 1], fold them into [0, 1]
fn trigger_value(value: f32) -> f32 {
    if value < 0.0 {
        (value + 1.0) / 2.0
    } else {
        value.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpad_combinations_map_to_switch_angles() {
        let cases = [
            ((true, false, false, false), Some(0)),
            ((true, true, false, false), Some(45)),
            ((false, true, false, false), Some(90)),
            ((false, true, true, false), Some(135)),
            ((false, false, true, false), Some(180)),
            ((false, false, true, true), Some(225)),
            ((false, false, false, true), Some(270)),
            ((true, false, false, true), Some(315)),
            ((false, false, false, false), None),
            ((true, false, true, false), None),
        ];

        for ((up, right, down, left), expected) in cases {
            let dpad = DpadState {
                up,
                right,
                down,
                left,
            };
            assert_eq!(dpad.angle(), expected, "{:?}", dpad);
        }
    }

    #[test]
    fn dpad_only_tracks_directional_buttons() {
        let mut dpad = DpadState::default();
        assert!(dpad.set(Button::DPadLeft, true));
        assert!(!dpad.set(Button::South, true));
        assert_eq!(dpad.angle(), Some(270));
    }

    #[test]
    fn deadzone_zeroes_small_values_and_rescales_the_rest() {
        assert_eq!(apply_deadzone(0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.05), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.05), -1.0);
        assert!((apply_deadzone(0.525, 0.05) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn face_buttons_follow_xbox_layout() {
        assert_eq!(map_button(Button::South), Some(XboxButton::A));
        assert_eq!(map_button(Button::North), Some(XboxButton::Y));
        assert_eq!(map_button(Button::West), Some(XboxButton::X));
        assert_eq!(map_button(Button::DPadUp), None);
    }

    #[test]
    fn neutral_update_releases_everything() {
        let mut state = ControllerState::default();
        StateUpdate::Button(XboxButton::Start, true).apply(&mut state);
        StateUpdate::Pov(Some(45)).apply(&mut state);
        StateUpdate::Axis(XboxAxis::RightTrigger, 0.9).apply(&mut state);
        assert!(state.button(XboxButton::Start));

        StateUpdate::Neutral.apply(&mut state);
        assert!(!state.button(XboxButton::Start));
        assert_eq!(state.pov, None);
        assert_eq!(state.axis(XboxAxis::RightTrigger), 0.0);
    }

    #[test]
    fn deadzone_of_full_deflection_never_divides_by_zero() {
        assert_eq!(apply_deadzone(1.0, 1.0), 0.0);
        assert_eq!(apply_deadzone(-1.0, 1.0), 0.0);
        assert_eq!(apply_deadzone(0.05, 0.05), 0.0);
    }

    #[test]
    fn reconnected_gamepad_with_new_id_is_adopted() {
        let mut active = Some(0usize);

        assert_eq!(route_event(active, 0, Presence::Input), EventRoute::Handle);
        assert_eq!(route_event(active, 1, Presence::Input), EventRoute::Skip);

        assert_eq!(
            route_event(active, 0, Presence::Disconnected),
            EventRoute::Release
        );
        active = None;

        assert_eq!(
            route_event(active, 1, Presence::Connected),
            EventRoute::Adopt(1)
        );
        active = Some(1);

        assert_eq!(route_event(active, 1, Presence::Input), EventRoute::Handle);
        assert_eq!(route_event(active, 0, Presence::Input), EventRoute::Skip);
    }

    #[test]
    fn unfollowed_collector_adopts_first_input_but_not_disconnects() {
        assert_eq!(route_event(None, 3usize, Presence::Input), EventRoute::Adopt(3));
        assert_eq!(
            route_event(None, 3usize, Presence::Disconnected),
            EventRoute::Skip
        );
    }

    #[test]
    fn other_gamepad_disconnecting_does_not_release_the_followed_one() {
        assert_eq!(
            route_event(Some(0usize), 2, Presence::Disconnected),
            EventRoute::Skip
        );
    }

    #[test]
    fn gilrs_connection_events_map_to_presence() {
        assert_eq!(Presence::of(&EventType::Connected), Presence::Connected);
        assert_eq!(Presence::of(&EventType::Disconnected), Presence::Disconnected);
        assert_eq!(Presence::of(&EventType::Dropped), Presence::Input);
    }

    #[test]
    fn trigger_values_fold_into_unit_range() {
        assert_eq!(trigger_value(-1.0), 0.0);
        assert_eq!(trigger_value(1.0), 1.0);
        assert_eq!(trigger_value(0.25), 0.25);
    }
}
