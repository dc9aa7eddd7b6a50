//! Input management system
//!
//! Game logic reads a normalized [`ControlState`]: two analog sticks in
//! `[-1, 1]` plus "held" and "just pressed" button sets. The
//! [`InputManager`] builds that state from raw keyboard and gamepad events,
//! mapping keys onto pad buttons through a configurable [`KeyMap`].

use std::collections::HashSet;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec2;

bitflags! {
    /// Set of gamepad buttons
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u32 {
        /// Face button A
        const A = 1 << 0;
        /// Face button B
        const B = 1 << 1;
        /// Face button X
        const X = 1 << 2;
        /// Face button Y
        const Y = 1 << 3;
        /// Left shoulder
        const LEFT_SHOULDER = 1 << 4;
        /// Right shoulder
        const RIGHT_SHOULDER = 1 << 5;
        /// Left trigger
        const LEFT_TRIGGER = 1 << 6;
        /// Right trigger
        const RIGHT_TRIGGER = 1 << 7;
        /// Left stick click
        const LEFT_STICK = 1 << 8;
        /// Right stick click
        const RIGHT_STICK = 1 << 9;
        /// Back
        const BACK = 1 << 10;
        /// Start
        const START = 1 << 11;
        /// Left stick pushed up
        const LEFT_THUMB_UP = 1 << 12;
        /// Left stick pushed down
        const LEFT_THUMB_DOWN = 1 << 13;
        /// Left stick pushed left
        const LEFT_THUMB_LEFT = 1 << 14;
        /// Left stick pushed right
        const LEFT_THUMB_RIGHT = 1 << 15;
        /// Right stick pushed up
        const RIGHT_THUMB_UP = 1 << 16;
        /// Right stick pushed down
        const RIGHT_THUMB_DOWN = 1 << 17;
        /// Right stick pushed left
        const RIGHT_THUMB_LEFT = 1 << 18;
        /// Right stick pushed right
        const RIGHT_THUMB_RIGHT = 1 << 19;
    }
}

/// A single pad button, as named in key map files
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    A,
    B,
    X,
    Y,
    LeftShoulder,
    RightShoulder,
    LeftTrigger,
    RightTrigger,
    LeftStick,
    RightStick,
    Back,
    Start,
    LeftThumbUp,
    LeftThumbDown,
    LeftThumbLeft,
    LeftThumbRight,
    RightThumbUp,
    RightThumbDown,
    RightThumbLeft,
    RightThumbRight,
}

impl Button {
    /// The flag for this button
    pub fn flag(self) -> Buttons {
        match self {
            Self::A => Buttons::A,
            Self::B => Buttons::B,
            Self::X => Buttons::X,
            Self::Y => Buttons::Y,
            Self::LeftShoulder => Buttons::LEFT_SHOULDER,
            Self::RightShoulder => Buttons::RIGHT_SHOULDER,
            Self::LeftTrigger => Buttons::LEFT_TRIGGER,
            Self::RightTrigger => Buttons::RIGHT_TRIGGER,
            Self::LeftStick => Buttons::LEFT_STICK,
            Self::RightStick => Buttons::RIGHT_STICK,
            Self::Back => Buttons::BACK,
            Self::Start => Buttons::START,
            Self::LeftThumbUp => Buttons::LEFT_THUMB_UP,
            Self::LeftThumbDown => Buttons::LEFT_THUMB_DOWN,
            Self::LeftThumbLeft => Buttons::LEFT_THUMB_LEFT,
            Self::LeftThumbRight => Buttons::LEFT_THUMB_RIGHT,
            Self::RightThumbUp => Buttons::RIGHT_THUMB_UP,
            Self::RightThumbDown => Buttons::RIGHT_THUMB_DOWN,
            Self::RightThumbLeft => Buttons::RIGHT_THUMB_LEFT,
            Self::RightThumbRight => Buttons::RIGHT_THUMB_RIGHT,
        }
    }
}

/// Key codes
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Space,
    Enter,
    Escape,
    LeftShift,
    LeftControl,
    Up,
    Down,
    Left,
    Right,
}

/// One keyboard key standing in for a pad button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Pad button driven by the key
    pub button: Button,
    /// Keyboard key
    pub key: KeyCode,
}

/// Keyboard to gamepad mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMap {
    /// Bindings; a button may have several keys
    pub bindings: Vec<KeyBinding>,
}

impl KeyMap {
    /// Pad buttons driven by the given set of pressed keys
    pub fn buttons_for(&self, pressed: &HashSet<KeyCode>) -> Buttons {
        self.bindings
            .iter()
            .filter(|binding| pressed.contains(&binding.key))
            .fold(Buttons::empty(), |acc, binding| acc | binding.button.flag())
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        let bind = |button, key| KeyBinding { button, key };
        Self {
            bindings: vec![
                bind(Button::X, KeyCode::W),
                bind(Button::A, KeyCode::S),
                bind(Button::A, KeyCode::Enter),
                bind(Button::B, KeyCode::E),
                bind(Button::Y, KeyCode::R),
                bind(Button::LeftShoulder, KeyCode::LeftShift),
                bind(Button::LeftStick, KeyCode::Space),
                bind(Button::Start, KeyCode::Escape),
                bind(Button::LeftThumbUp, KeyCode::Up),
                bind(Button::LeftThumbDown, KeyCode::Down),
                bind(Button::LeftThumbLeft, KeyCode::Left),
                bind(Button::LeftThumbRight, KeyCode::Right),
                bind(Button::LeftThumbLeft, KeyCode::A),
                bind(Button::LeftThumbRight, KeyCode::D),
            ],
        }
    }
}

/// Normalized controls for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlState {
    /// Left stick, each axis in `[-1, 1]`, +Y up
    pub left_thumb: Vec2,
    /// Right stick, each axis in `[-1, 1]`, +Y up
    pub right_thumb: Vec2,
    /// Buttons currently down
    pub held: Buttons,
    /// Buttons that went down this tick
    pub just_pressed: Buttons,
}

impl ControlState {
    /// True while every button in `buttons` is down
    pub fn is_held(&self, buttons: Buttons) -> bool {
        self.held.contains(buttons)
    }

    /// True on the tick every button in `buttons` went down
    pub fn is_just_pressed(&self, buttons: Buttons) -> bool {
        self.just_pressed.contains(buttons)
    }
}

/// Input manager
///
/// Collects raw events between ticks and turns them into a [`ControlState`].
#[derive(Debug, Clone, Default)]
pub struct InputManager {
    key_map: KeyMap,
    pressed_keys: HashSet<KeyCode>,
    pad_buttons: Buttons,
    pad_left_thumb: Vec2,
    pad_right_thumb: Vec2,
    previous: Buttons,
}

impl InputManager {
    /// Create a new input manager with the default key map
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input manager with a custom key map
    pub fn with_key_map(key_map: KeyMap) -> Self {
        Self {
            key_map,
            ..Self::default()
        }
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed_keys.insert(key);
        } else {
            self.pressed_keys.remove(&key);
        }
    }

    /// Replace the gamepad state
    pub fn set_gamepad(&mut self, buttons: Buttons, left_thumb: Vec2, right_thumb: Vec2) {
        self.pad_buttons = buttons;
        self.pad_left_thumb = left_thumb;
        self.pad_right_thumb = right_thumb;
    }

    /// Build this tick's control state and remember it for edge detection
    pub fn update(&mut self) -> ControlState {
        let held = self.pad_buttons | self.key_map.buttons_for(&self.pressed_keys);
        let just_pressed = held & !self.previous;
        self.previous = held;

        ControlState {
            left_thumb: Self::stick(
                self.pad_left_thumb,
                held,
                [Buttons::LEFT_THUMB_LEFT, Buttons::LEFT_THUMB_RIGHT, Buttons::LEFT_THUMB_DOWN, Buttons::LEFT_THUMB_UP],
            ),
            right_thumb: Self::stick(
                self.pad_right_thumb,
                held,
                [Buttons::RIGHT_THUMB_LEFT, Buttons::RIGHT_THUMB_RIGHT, Buttons::RIGHT_THUMB_DOWN, Buttons::RIGHT_THUMB_UP],
            ),
            held,
            just_pressed,
        }
    }

    /// Analog stick plus digital directions, clamped per axis
    fn stick(analog: Vec2, held: Buttons, [left, right, down, up]: [Buttons; 4]) -> Vec2 {
        let axis = |negative: Buttons, positive: Buttons| -> f32 {
            f32::from(u8::from(held.contains(positive))) - f32::from(u8::from(held.contains(negative)))
        };
        Vec2::new(
            (analog.x + axis(left, right)).clamp(-1.0, 1.0),
            (analog.y + axis(down, up)).clamp(-1.0, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_fires_once() {
        let mut input = InputManager::new();

        input.handle_key_input(KeyCode::Space, true);
        let first = input.update();
        assert!(first.is_held(Buttons::LEFT_STICK));
        assert!(first.is_just_pressed(Buttons::LEFT_STICK));

        let second = input.update();
        assert!(second.is_held(Buttons::LEFT_STICK));
        assert!(!second.is_just_pressed(Buttons::LEFT_STICK));

        input.handle_key_input(KeyCode::Space, false);
        assert!(!input.update().is_held(Buttons::LEFT_STICK));
    }

    #[test]
    fn test_keys_and_pad_combine() {
        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::W, true);
        input.set_gamepad(Buttons::LEFT_SHOULDER, Vec2::zeros(), Vec2::zeros());

        let state = input.update();
        assert!(state.is_held(Buttons::X | Buttons::LEFT_SHOULDER));
    }

    #[test]
    fn test_digital_directions_drive_stick() {
        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::Up, true);
        input.handle_key_input(KeyCode::D, true);
        input.set_gamepad(Buttons::empty(), Vec2::new(0.5, 0.5), Vec2::zeros());

        let state = input.update();
        assert_eq!(state.left_thumb, Vec2::new(1.0, 1.0));
        assert_eq!(state.right_thumb, Vec2::zeros());
    }

    #[test]
    fn test_custom_key_map() {
        let key_map = KeyMap {
            bindings: vec![KeyBinding { button: Button::A, key: KeyCode::J }],
        };
        let mut input = InputManager::with_key_map(key_map);

        input.handle_key_input(KeyCode::S, true);
        assert!(!input.update().is_held(Buttons::A));

        input.handle_key_input(KeyCode::J, true);
        assert!(input.update().is_just_pressed(Buttons::A));
    }
}
