use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(MoveKey),
    Harvest,
    Submit,
    Erase,
}

pub fn map_key(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(Command::Move(MoveKey::Forward)),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(Command::Move(MoveKey::Backward)),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(Command::Move(MoveKey::Left)),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(Command::Move(MoveKey::Right)),
        KeyCode::Space => Some(Command::Harvest),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Command::Submit),
        KeyCode::Backspace => Some(Command::Erase),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn set(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Backward => self.backward = pressed,
            MoveKey::Left => self.left = pressed,
            MoveKey::Right => self.right = pressed,
        }
    }

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    pub fn longitudinal(&self) -> bool {
        self.forward || self.backward
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_map_to_same_moves() {
        assert_eq!(map_key(KeyCode::KeyW), map_key(KeyCode::ArrowUp));
        assert_eq!(map_key(KeyCode::KeyS), Some(Command::Move(MoveKey::Backward)));
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Command::Move(MoveKey::Left)));
        assert_eq!(map_key(KeyCode::KeyD), Some(Command::Move(MoveKey::Right)));
        assert_eq!(map_key(KeyCode::Space), Some(Command::Harvest));
        assert_eq!(map_key(KeyCode::KeyQ), None);
    }

    #[test]
    fn flags_are_independent() {
        let mut input = InputState::default();
        assert!(!input.any());
        input.set(MoveKey::Left, true);
        assert!(input.any());
        assert!(!input.longitudinal());
        input.set(MoveKey::Forward, true);
        input.set(MoveKey::Left, false);
        assert!(input.forward && !input.left);
        assert!(input.longitudinal());
        input.clear();
        assert_eq!(input, InputState::default());
    }
}
