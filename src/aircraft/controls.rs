use serde::{Deserialize, Serialize};

/// The eight control inputs the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    PitchUp,
    PitchDown,
    SteerLeft,
    SteerRight,
    ThrottleUp,
    ThrottleDown,
    ReverseToggle,
    Restart,
}

impl KeyCode {
    pub const ALL: [KeyCode; 8] = [
        KeyCode::PitchUp,
        KeyCode::PitchDown,
        KeyCode::SteerLeft,
        KeyCode::SteerRight,
        KeyCode::ThrottleUp,
        KeyCode::ThrottleDown,
        KeyCode::ReverseToggle,
        KeyCode::Restart,
    ];
}

/// Pitch command resolved from the raw key set for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchInput {
    Down,
    Neutral,
    Up,
}

/// Which keys are held during one tick. The caller owns debouncing; the
/// world layer edge-detects [`KeyCode::ReverseToggle`] and
/// [`KeyCode::Restart`] against the previous tick itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    pitch_up: bool,
    pitch_down: bool,
    steer_left: bool,
    steer_right: bool,
    throttle_up: bool,
    throttle_down: bool,
    reverse_toggle: bool,
    restart: bool,
}

impl InputState {
    pub fn set(&mut self, key: KeyCode, held: bool) {
        match key {
            KeyCode::PitchUp => self.pitch_up = held,
            KeyCode::PitchDown => self.pitch_down = held,
            KeyCode::SteerLeft => self.steer_left = held,
            KeyCode::SteerRight => self.steer_right = held,
            KeyCode::ThrottleUp => self.throttle_up = held,
            KeyCode::ThrottleDown => self.throttle_down = held,
            KeyCode::ReverseToggle => self.reverse_toggle = held,
            KeyCode::Restart => self.restart = held,
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.set(key, false);
    }

    pub fn pressed(&self, key: KeyCode) -> bool {
        match key {
            KeyCode::PitchUp => self.pitch_up,
            KeyCode::PitchDown => self.pitch_down,
            KeyCode::SteerLeft => self.steer_left,
            KeyCode::SteerRight => self.steer_right,
            KeyCode::ThrottleUp => self.throttle_up,
            KeyCode::ThrottleDown => self.throttle_down,
            KeyCode::ReverseToggle => self.reverse_toggle,
            KeyCode::Restart => self.restart,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Pitch-up wins when both pitch keys are held.
    pub fn pitch(&self) -> PitchInput {
        if self.pitch_up {
            PitchInput::Up
        } else if self.pitch_down {
            PitchInput::Down
        } else {
            PitchInput::Neutral
        }
    }

    /// Steering as -1 (left), 0, or +1 (right); left wins on conflict.
    pub fn steer(&self) -> f64 {
        if self.steer_left {
            -1.0
        } else if self.steer_right {
            1.0
        } else {
            0.0
        }
    }

    /// Throttle command as -1, 0, or +1 per tick; increase wins on conflict.
    pub fn throttle(&self) -> f64 {
        if self.throttle_up {
            1.0
        } else if self.throttle_down {
            -1.0
        } else {
            0.0
        }
    }
}
