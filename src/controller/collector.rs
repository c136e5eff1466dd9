use crate::config::BackendSettings;
use crate::controller::sample::{DeviceClass, DeviceIdentity, RawButton, RawDeviceSample};
use crate::mapping::MappingDatabase;
use chrono::{DateTime, Local};
use gilrs::ev::Code;
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs, MappingSource};
use statum::{machine, state};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// What the backend reports to the host each poll
#[derive(Debug, Clone)]
pub enum BackendEvent {
    Connected {
        identity: DeviceIdentity,
        timestamp: DateTime<Local>,
    },
    Disconnected {
        identity: DeviceIdentity,
        timestamp: DateTime<Local>,
    },
    Sample(RawDeviceSample),
}

// Collector settings
#[derive(Clone, Debug)]
pub struct CollectorSettings {
    pub poll_interval_ms: u64,
    pub joystick_deadzone: f32,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        BackendSettings::default().into()
    }
}

impl From<BackendSettings> for CollectorSettings {
    fn from(settings: BackendSettings) -> Self {
        Self {
            poll_interval_ms: settings.poll_interval_ms,
            joystick_deadzone: settings.deadzone(),
        }
    }
}

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize collector: {0}")]
    InitializationError(String),

    #[error("Failed to send event: {0}")]
    EventSendError(String),

    #[error("Failed to spawn collector thread: {0}")]
    ThreadError(String),
}

// Every gilrs button and axis, used to discover a device's raw codes
const ALL_BUTTONS: [Button; 19] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::C,
    Button::Z,
    Button::LeftTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

const ALL_AXES: [Axis; 8] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
    Axis::DPadX,
    Axis::DPadY,
];

/// What is fixed about a gamepad for the length of its connection
#[derive(Debug, Clone)]
pub struct ConnectedPad {
    pub identity: DeviceIdentity,
    /// Sent in standard order instead of raw code order
    pub native: bool,
    /// Raw button codes, in raw index order
    button_codes: Vec<Code>,
    /// Raw axis codes, in raw index order
    axis_codes: Vec<Code>,
}

// Standard order of the 17 output buttons, in gilrs terms
const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

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

    // Used to decide whether a natively mapped pad should be sent raw
    database: Arc<MappingDatabase>,

    settings: CollectorSettings,

    // Channel to the host
    event_sender: mpsc::Sender<BackendEvent>,

    // Every connected gamepad
    pads: HashMap<GamepadId, ConnectedPad>,
}

impl<S: CollectionState> EventCollector<S> {
    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    fn send(&self, event: BackendEvent) -> Result<(), CollectorError> {
        self.event_sender
            .blocking_send(event)
            .map_err(|e| CollectorError::EventSendError(e.to_string()))
    }

    // Resolves the database once and fixes the raw code order for this connection.
    fn register(&mut self, id: GamepadId) -> Result<(), CollectorError> {
        let pad = {
            let gamepad = self.gilrs.gamepad(id);
            let identity = identity_of(&gamepad);
            // Pads with a positional database entry are sent raw so that entry applies.
            let native = !matches!(gamepad.mapping_source(), MappingSource::None)
                && !self.database.has_definition(&identity.guid, &identity.name);

            let state = gamepad.state();
            let button_codes = ordered_codes(
                ALL_BUTTONS
                    .iter()
                    .filter_map(|button| gamepad.button_code(*button))
                    .chain(state.buttons().map(|(code, _)| code)),
            );
            let axis_codes = ordered_codes(
                ALL_AXES
                    .iter()
                    .filter_map(|axis| gamepad.axis_code(*axis))
                    .chain(state.axes().map(|(code, _)| code)),
            );

            ConnectedPad {
                identity,
                native,
                button_codes,
                axis_codes,
            }
        };

        info!(
            "Controller connected: {} ({}), {} buttons, {} axes, {}",
            pad.identity.name,
            pad.identity.guid,
            pad.button_codes.len(),
            pad.axis_codes.len(),
            if pad.native { "standard order" } else { "raw order" }
        );
        let identity = pad.identity.clone();
        self.pads.insert(id, pad);
        self.send(BackendEvent::Connected {
            identity,
            timestamp: Local::now(),
        })
    }
}

// Implementation for Initializing state
impl EventCollector<Initializing> {
    pub fn create(
        settings: Option<CollectorSettings>,
        database: Arc<MappingDatabase>,
        event_sender: mpsc::Sender<BackendEvent>,
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

        Ok(Self::new(gilrs, database, settings, event_sender, HashMap::new()))
    }

    // Announce already connected gamepads and transition to Collecting
    pub fn initialize(mut self) -> Result<EventCollector<Collecting>, CollectorError> {
        let connected: Vec<GamepadId> = self.gilrs.gamepads().map(|(id, _)| id).collect();

        if connected.is_empty() {
            warn!("No gamepad connected, waiting for one");
        } else {
            info!("Found {} gamepads", connected.len());
        }

        for id in connected {
            self.register(id)?;
        }

        info!("Event Collector initialized, transitioning to Collecting state");
        Ok(self.transition())
    }
}

// Implementation for Collecting state
impl EventCollector<Collecting> {
    // Drain connection events, then report one sample per gamepad
    pub fn collect(&mut self) -> Result<usize, CollectorError> {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => self.register(id)?,
                EventType::Disconnected => {
                    if let Some(pad) = self.pads.remove(&id) {
                        warn!("Controller disconnected: {} ({})", pad.identity.name, pad.identity.guid);
                        self.send(BackendEvent::Disconnected {
                            identity: pad.identity,
                            timestamp: Local::now(),
                        })?;
                    }
                }
                // Button and axis values are read from the gamepad state below
                _ => {}
            }
        }

        let samples: Vec<RawDeviceSample> = self
            .pads
            .iter()
            .map(|(id, pad)| self.sample_for(self.gilrs.gamepad(*id), pad))
            .collect();
        let count = samples.len();

        for sample in samples {
            self.send(BackendEvent::Sample(sample))?;
        }
        Ok(count)
    }

    pub fn run_collection_loop(&mut self) -> Result<(), CollectorError> {
        info!("Starting Event Collector loop");

        // For performance monitoring
        let mut sample_count = 0;
        let mut last_log_time = Local::now();
        let log_interval = chrono::Duration::seconds(30);
        let pause = Duration::from_millis(self.settings.poll_interval_ms);

        loop {
            sample_count += self.collect()?;

            let now = Local::now();
            if now - last_log_time > log_interval {
                debug!(
                    "Event Collector stats: {} samples in last {} seconds",
                    sample_count,
                    log_interval.num_seconds()
                );
                sample_count = 0;
                last_log_time = now;
            }

            std::thread::sleep(pause);
        }
    }

    fn sample_for(&self, gamepad: Gamepad<'_>, pad: &ConnectedPad) -> RawDeviceSample {
        let sample = RawDeviceSample::new(pad.identity.guid.clone(), pad.identity.name.clone())
            .with_haptics(gamepad.is_ff_supported());

        if pad.native {
            self.standard_sample(gamepad, sample)
        } else {
            self.raw_sample(gamepad, pad, sample)
        }
    }

    fn standard_sample(&self, gamepad: Gamepad<'_>, sample: RawDeviceSample) -> RawDeviceSample {
        let deadzone = self.settings.joystick_deadzone;
        let buttons = STANDARD_BUTTONS.iter().map(|button| match gamepad.button_data(*button) {
            Some(data) => RawButton {
                pressed: data.is_pressed(),
                value: data.value(),
            },
            None => RawButton::default(),
        });
        // gilrs reports up as positive; the standard layout wants it negative.
        let axes = [
            gamepad.value(Axis::LeftStickX),
            -gamepad.value(Axis::LeftStickY),
            gamepad.value(Axis::RightStickX),
            -gamepad.value(Axis::RightStickY),
        ]
        .map(|value| apply_deadzone(value, deadzone));

        sample
            .with_class(DeviceClass::Recognized)
            .with_buttons(buttons)
            .with_axes(axes)
    }

    // Inputs without data yet report at rest, so raw indices never shift.
    fn raw_sample(&self, gamepad: Gamepad<'_>, pad: &ConnectedPad, sample: RawDeviceSample) -> RawDeviceSample {
        let deadzone = self.settings.joystick_deadzone;
        let state = gamepad.state();

        let buttons = values_in_order(&pad.button_codes, |code| {
            state.button_data(code).map(|data| RawButton {
                pressed: data.is_pressed(),
                value: data.value(),
            })
        });
        let axes = values_in_order(&pad.axis_codes, |code| {
            state
                .axis_data(code)
                .map(|data| apply_deadzone(data.value(), deadzone))
        });

        sample
            .with_class(DeviceClass::Raw)
            .with_buttons(buttons)
            .with_axes(axes)
    }
}

// Public interface for spawning and running the collector
pub struct CollectorHandle {
    thread: JoinHandle<()>,
}

impl CollectorHandle {
    // gilrs is created and polled on its own thread
    pub fn spawn(
        settings: Option<CollectorSettings>,
        database: Arc<MappingDatabase>,
        event_sender: mpsc::Sender<BackendEvent>,
    ) -> Result<Self, CollectorError> {
        info!("Spawning Event Collector with settings: {:?}", settings);

        let thread = std::thread::Builder::new()
            .name("padnorm-collector".to_string())
            .spawn(move || {
                let collector = match EventCollector::create(settings, database, event_sender) {
                    Ok(collector) => collector,
                    Err(e) => {
                        error!("Failed to create Event Collector: {}", e);
                        return;
                    }
                };
                match collector.initialize() {
                    Ok(mut collecting) => {
                        if let Err(e) = collecting.run_collection_loop() {
                            info!("Event Collector stopped: {}", e);
                        }
                    }
                    Err(e) => error!("Failed to initialize Event Collector: {}", e),
                }
            })
            .map_err(|e| CollectorError::ThreadError(e.to_string()))?;

        Ok(Self { thread })
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

fn identity_of(gamepad: &Gamepad<'_>) -> DeviceIdentity {
    let guid: String = gamepad.uuid().iter().map(|byte| format!("{:02x}", byte)).collect();
    DeviceIdentity::new(guid, gamepad.name())
}

// Sorted by raw code value, duplicates removed
fn ordered_codes(codes: impl IntoIterator<Item = Code>) -> Vec<Code> {
    let mut ordered: Vec<Code> = codes.into_iter().collect();
    ordered.sort_by_key(Code::into_u32);
    ordered.dedup_by_key(|code| code.into_u32());
    ordered
}

// One value per code, positions fixed by `codes`
fn values_in_order<C: Copy, V: Default>(codes: &[C], value_of: impl Fn(C) -> Option<V>) -> Vec<V> {
    codes
        .iter()
        .map(|code| value_of(*code).unwrap_or_default())
        .collect()
}

// Helper function to apply deadzone to analog stick values
fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if deadzone <= 0.0 {
        value
    } else if value.abs() < deadzone {
        0.0
    } else {
        // Rescale the value to the range outside the deadzone
        let sign = if value < 0.0 { -1.0 } else { 1.0 };
        sign * (value.abs() - deadzone) / (1.0 - deadzone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_indices_follow_the_code_list_not_the_inputs_seen() {
        let codes = [304u32, 305, 307, 308];

        // only the second code has reported anything so far
        let buttons = values_in_order(&codes, |code| (code == 305).then_some(RawButton::from(true)));
        assert_eq!(buttons.len(), 4);
        assert!(!buttons[0].pressed);
        assert!(buttons[1].pressed);

        let axes = values_in_order(&codes[..2], |code| (code == 304).then_some(-0.5));
        assert_eq!(axes, vec![-0.5, 0.0]);
    }

    #[test]
    fn deadzone_rescales_outside_range() {
        assert_eq!(apply_deadzone(0.04, 0.05), 0.0);
        assert_eq!(apply_deadzone(1.0, 0.05), 1.0);
        assert_eq!(apply_deadzone(-1.0, 0.05), -1.0);
        assert_eq!(apply_deadzone(0.3, 0.0), 0.3);
    }
}
