//! Native keyboard bindings.
//!
//! | Key | Command |
//! |---|---|
//! | W/S/A/D or arrows, Space | drive (held) |
//! | Tab | next part |
//! | B / M / G | next body / rim / glass preset |
//! | 1-4 | front / side / rear / top view |
//! | C | follow camera on/off |
//! | R | auto-rotate on/off |
//! | E | next environment |
//! | H | shadows on/off |
//! | PageUp / PageDown | previous / next car |
//! | P | screenshot |
//! | U | share |
//! | F11 | fullscreen |

use winit::keyboard::KeyCode;

use crate::{
    camera::ViewPreset, command::Command, motion::DriveInput, parts::PartCategory,
    session::Session, stage::Environment,
};

fn next<T: PartialEq + Copy>(items: &[T], current: T, step: isize) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    let len = items.len() as isize;
    let idx = items.iter().position(|item| *item == current).unwrap_or(0) as isize;
    Some(items[(idx + step).rem_euclid(len) as usize])
}

/// Tracks held drive keys and turns key presses into commands.
#[derive(Debug, Default)]
pub struct Keyboard {
    drive: DriveInput,
}

impl Keyboard {
    pub fn on_key(&mut self, session: &Session, key: KeyCode, pressed: bool) -> Option<Command> {
        if let Some(held) = self.drive_key(key) {
            if *held == pressed {
                return None;
            }
            *held = pressed;
            return Some(Command::Drive(self.drive));
        }
        if !pressed {
            return None;
        }

        let selection = session.selection();
        let catalog = session.catalog();
        let command = match key {
            KeyCode::Tab => {
                let parts = session.available_parts();
                Command::SelectPart(next(&parts, selection.part, 1).unwrap_or(PartCategory::CarBody))
            }
            KeyCode::KeyB => Command::SelectBodyMaterial((selection.body + 1) % catalog.main().len()),
            KeyCode::KeyM => Command::SelectRimMaterial((selection.rim + 1) % catalog.main().len()),
            KeyCode::KeyG => {
                Command::SelectGlassMaterial((selection.glass + 1) % catalog.glass().len())
            }
            KeyCode::Digit1 => Command::SetCameraView(ViewPreset::Front),
            KeyCode::Digit2 => Command::SetCameraView(ViewPreset::Side),
            KeyCode::Digit3 => Command::SetCameraView(ViewPreset::Rear),
            KeyCode::Digit4 => Command::SetCameraView(ViewPreset::Top),
            KeyCode::KeyC => Command::SetFollowCamera(!session.follow_camera()),
            KeyCode::KeyR => Command::SetAutoRotate(!session.auto_rotate()),
            KeyCode::KeyE => Command::SelectEnvironment(next(
                &Environment::SELECTABLE,
                session.stage.environment,
                1,
            )?),
            KeyCode::KeyH => Command::SetShadows(!session.stage.shadows),
            KeyCode::PageUp => Command::SelectCar(next(session.profile().lineup, selection.car, -1)?),
            KeyCode::PageDown => Command::SelectCar(next(session.profile().lineup, selection.car, 1)?),
            KeyCode::KeyP => Command::Screenshot,
            KeyCode::KeyU => Command::Share,
            KeyCode::F11 => Command::ToggleFullscreen,
            _ => return None,
        };
        Some(command)
    }

    fn drive_key(&mut self, key: KeyCode) -> Option<&mut bool> {
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(&mut self.drive.forward),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(&mut self.drive.backward),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(&mut self.drive.left),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(&mut self.drive.right),
            KeyCode::Space => Some(&mut self.drive.brake),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{garage::CarChoice, launch::LaunchOptions};

    #[test]
    fn held_keys_only_report_changes() {
        let session = Session::new(&LaunchOptions::default());
        let mut keyboard = Keyboard::default();
        let pressed = keyboard.on_key(&session, KeyCode::KeyW, true);
        assert_eq!(
            pressed,
            Some(Command::Drive(DriveInput {
                forward: true,
                ..Default::default()
            }))
        );
        // key repeat
        assert_eq!(keyboard.on_key(&session, KeyCode::KeyW, true), None);
        assert_eq!(
            keyboard.on_key(&session, KeyCode::KeyW, false),
            Some(Command::Drive(DriveInput::default()))
        );
    }

    #[test]
    fn page_keys_cycle_the_lineup() {
        let options = LaunchOptions::from_pairs([("app", "showroom")]);
        let session = Session::new(&options);
        let mut keyboard = Keyboard::default();
        assert_eq!(
            keyboard.on_key(&session, KeyCode::PageDown, true),
            Some(Command::SelectCar(CarChoice::Lamborghini))
        );
        assert_eq!(
            keyboard.on_key(&session, KeyCode::PageUp, true),
            Some(Command::SelectCar(CarChoice::McLaren))
        );
    }

    #[test]
    fn presets_wrap_around() {
        let session = Session::new(&LaunchOptions::default());
        let mut keyboard = Keyboard::default();
        let glass = session.catalog().glass().len();
        assert_eq!(
            keyboard.on_key(&session, KeyCode::KeyG, true),
            Some(Command::SelectGlassMaterial(1 % glass))
        );
        assert_eq!(keyboard.on_key(&session, KeyCode::KeyG, false), None);
    }
}
