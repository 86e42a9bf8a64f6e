use serde::{Deserialize, Serialize};

/// Logical control actions the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Jump,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Forward,
        Action::Backward,
        Action::TurnLeft,
        Action::TurnRight,
        Action::Jump,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A key-down or key-up event crossing the input boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub key: String,
    pub pressed: bool,
}

impl InputEvent {
    pub fn down(key: impl Into<String>) -> Self {
        Self { key: key.into(), pressed: true }
    }

    pub fn up(key: impl Into<String>) -> Self {
        Self { key: key.into(), pressed: false }
    }
}

/// Key symbols bound to each action.
/// Symbols follow browser `KeyboardEvent.key` naming ("z", " ", "ArrowUp").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub turn_left: Vec<String>,
    pub turn_right: Vec<String>,
    pub jump: Vec<String>,
}

fn keys(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: keys(&["z", "w", "ArrowUp"]),
            backward: keys(&["s", "ArrowDown"]),
            turn_left: keys(&["q", "a", "ArrowLeft"]),
            turn_right: keys(&["d", "ArrowRight"]),
            jump: keys(&[" ", "Space"]),
        }
    }
}

impl KeyBindings {
    fn bound(&self, action: Action) -> &[String] {
        match action {
            Action::Forward => &self.forward,
            Action::Backward => &self.backward,
            Action::TurnLeft => &self.turn_left,
            Action::TurnRight => &self.turn_right,
            Action::Jump => &self.jump,
        }
    }

    /// Resolves a key symbol; letters match case-insensitively so Shift doesn't drop input.
    pub fn action_for(&self, key: &str) -> Option<Action> {
        Action::ALL.into_iter().find(|&action| {
            self.bound(action).iter().any(|k| {
                k == key || (k.chars().count() == 1 && k.eq_ignore_ascii_case(key))
            })
        })
    }
}

/// Currently held actions plus the pending jump edge.
/// Written only by key events, read by the simulation each tick.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: u8,
    jump_edge: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transition. A press of an already-held Jump (key auto-repeat) does not re-arm the edge.
    pub fn set_pressed(&mut self, action: Action, pressed: bool) {
        let was_pressed = self.is_pressed(action);
        if pressed {
            self.held |= action.bit();
            if action == Action::Jump && !was_pressed {
                self.jump_edge = true;
            }
        } else {
            self.held &= !action.bit();
        }
    }

    pub fn is_pressed(&self, action: Action) -> bool {
        self.held & action.bit() != 0
    }

    /// Returns true at most once per physical jump press.
    pub fn consume_jump_edge(&mut self) -> bool {
        std::mem::take(&mut self.jump_edge)
    }

    /// Maps a raw key through the bindings. Returns false for unbound keys, which are ignored.
    pub fn apply_key(&mut self, bindings: &KeyBindings, key: &str, pressed: bool) -> bool {
        match bindings.action_for(key) {
            Some(action) => {
                self.set_pressed(action, pressed);
                true
            }
            None => false,
        }
    }

    pub fn apply_event(&mut self, bindings: &KeyBindings, event: &InputEvent) -> bool {
        self.apply_key(bindings, &event.key, event.pressed)
    }

    /// Releases everything (window lost focus). A pending jump edge is dropped too.
    pub fn clear(&mut self) {
        self.held = 0;
        self.jump_edge = false;
    }

    /// +1 forward, -1 backward, 0 when neither or both are held
    pub fn throttle(&self) -> f32 {
        let mut t = 0.0;
        if self.is_pressed(Action::Forward) {
            t += 1.0;
        }
        if self.is_pressed(Action::Backward) {
            t -= 1.0;
        }
        t
    }

    /// +1 left, -1 right, 0 when neither or both are held
    pub fn steering(&self) -> f32 {
        let mut s = 0.0;
        if self.is_pressed(Action::TurnLeft) {
            s += 1.0;
        }
        if self.is_pressed(Action::TurnRight) {
            s -= 1.0;
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_edge_fires_once_per_press() {
        let mut input = InputState::new();
        input.set_pressed(Action::Jump, true);
        assert!(input.consume_jump_edge());
        assert!(!input.consume_jump_edge());

        // Auto-repeat while held must not re-arm.
        input.set_pressed(Action::Jump, true);
        input.set_pressed(Action::Jump, true);
        assert!(!input.consume_jump_edge());
        assert!(input.is_pressed(Action::Jump));

        input.set_pressed(Action::Jump, false);
        assert!(!input.consume_jump_edge());

        input.set_pressed(Action::Jump, true);
        assert!(input.consume_jump_edge());
    }

    #[test]
    fn unconsumed_edge_survives_release() {
        let mut input = InputState::new();
        input.set_pressed(Action::Jump, true);
        input.set_pressed(Action::Jump, false);
        assert!(input.consume_jump_edge());
    }

    #[test]
    fn held_actions_are_level_triggered() {
        let mut input = InputState::new();
        input.set_pressed(Action::Forward, true);
        input.set_pressed(Action::TurnLeft, true);
        assert!(input.is_pressed(Action::Forward));
        assert!(input.is_pressed(Action::TurnLeft));
        assert!(!input.is_pressed(Action::Backward));
        assert_eq!(input.throttle(), 1.0);
        assert_eq!(input.steering(), 1.0);

        input.set_pressed(Action::Backward, true);
        assert_eq!(input.throttle(), 0.0);

        input.set_pressed(Action::Forward, false);
        assert_eq!(input.throttle(), -1.0);
    }

    #[test]
    fn unbound_keys_are_ignored() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        assert!(!input.apply_key(&bindings, "F13", true));
        assert!(Action::ALL.iter().all(|&a| !input.is_pressed(a)));
        assert!(!input.consume_jump_edge());
    }

    #[test]
    fn default_bindings_cover_azerty_and_qwerty() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.action_for("z"), Some(Action::Forward));
        assert_eq!(bindings.action_for("W"), Some(Action::Forward));
        assert_eq!(bindings.action_for("q"), Some(Action::TurnLeft));
        assert_eq!(bindings.action_for("d"), Some(Action::TurnRight));
        assert_eq!(bindings.action_for(" "), Some(Action::Jump));
        assert_eq!(bindings.action_for("ArrowDown"), Some(Action::Backward));
        assert_eq!(bindings.action_for("arrowdown"), None);
    }

    #[test]
    fn events_drive_state_through_bindings() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.apply_event(&bindings, &InputEvent::down("Space"));
        input.apply_event(&bindings, &InputEvent::down("ArrowRight"));
        assert!(input.consume_jump_edge());
        assert_eq!(input.steering(), -1.0);

        input.apply_event(&bindings, &InputEvent::up("ArrowRight"));
        assert_eq!(input.steering(), 0.0);

        input.apply_event(&bindings, &InputEvent::down("z"));
        input.clear();
        assert_eq!(input.throttle(), 0.0);
    }
}
