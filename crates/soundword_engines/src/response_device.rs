#![forbid(unsafe_code)]

use soundword_kernel_contracts::device::{GamepadMap, InputCode, InputEvent, KeyboardMap};
use soundword_kernel_contracts::trial::{LogicalResponse, ReactionTimeMs, TrialResponse};
use soundword_kernel_contracts::MonotonicTimeNs;
use tracing::{info, warn};

use crate::DeviceError;

/// Monotonic time source shared by the response timer and the phase pacer.
pub trait MonotonicClock {
    fn now(&self) -> MonotonicTimeNs;
}

/// Blocking stream of raw input events from the window/event layer.
pub trait InputEventSource {
    /// Blocks until the next event is available.
    fn next_event(&mut self) -> Result<InputEvent, DeviceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamepadInfo {
    pub name: String,
}

/// Capability probe for joystick/controller hardware. Any `Err` means "use the keyboard".
pub trait GamepadProbe {
    fn probe(&mut self) -> Result<GamepadInfo, String>;
}

/// Probe for hosts without a controller backend; always reports no hardware.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGamepadHardware;

impl GamepadProbe for NoGamepadHardware {
    fn probe(&mut self) -> Result<GamepadInfo, String> {
        Err("no controller backend available".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamepadDevice {
    pub info: GamepadInfo,
    pub map: GamepadMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardDevice {
    pub map: KeyboardMap,
}

/// The response device chosen once at startup. Never re-detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseDevice {
    Gamepad(GamepadDevice),
    Keyboard(KeyboardDevice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDeviceKind {
    Gamepad,
    Keyboard,
}

impl ResponseDevice {
    /// Uses the gamepad when the probe succeeds, otherwise falls back to the keyboard.
    pub fn acquire(
        probe: &mut dyn GamepadProbe,
        keyboard_map: KeyboardMap,
        gamepad_map: GamepadMap,
    ) -> Self {
        match probe.probe() {
            Ok(info) => {
                info!(gamepad = info.name.as_str(), "response device: gamepad");
                ResponseDevice::Gamepad(GamepadDevice {
                    info,
                    map: gamepad_map,
                })
            }
            Err(reason) => {
                warn!(reason = reason.as_str(), "gamepad unavailable, using keyboard");
                ResponseDevice::Keyboard(KeyboardDevice { map: keyboard_map })
            }
        }
    }

    pub fn kind(&self) -> ResponseDeviceKind {
        match self {
            ResponseDevice::Gamepad(_) => ResponseDeviceKind::Gamepad,
            ResponseDevice::Keyboard(_) => ResponseDeviceKind::Keyboard,
        }
    }

    /// Logical response for `code`, if this device maps it.
    pub fn map_input(&self, code: &InputCode) -> Option<LogicalResponse> {
        match (self, code) {
            (ResponseDevice::Gamepad(d), InputCode::Gamepad(c)) => d.map.lookup(*c),
            (ResponseDevice::Keyboard(d), InputCode::Key(k)) => d.map.lookup(k),
            _ => None,
        }
    }

    /// Resets the response timer and blocks until a mapped input arrives.
    ///
    /// Unmapped inputs and inputs stamped before the timer reset are skipped. There is no timeout.
    pub fn get_response(
        &self,
        source: &mut dyn InputEventSource,
        clock: &dyn MonotonicClock,
    ) -> Result<TrialResponse, DeviceError> {
        let started = clock.now();
        loop {
            let event = source.next_event()?;
            if event.at < started {
                continue;
            }
            if let Some(response) = self.map_input(&event.code) {
                return Ok(TrialResponse {
                    response,
                    reaction_time_ms: ReactionTimeMs(event.at.ms_since(started)),
                });
            }
        }
    }
}
