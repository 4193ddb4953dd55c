use anyhow::Result;
use log::{debug, info, warn};

use crate::config::Screen;
use crate::error::ActuationError;

/// Commands produced by the controller for the input-injection side.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    MoveTo { x: f64, y: f64 },
    MouseDown,
    MouseUp,
    Click,
    DoubleClick,
    RightClick,
    /// Wheel delta; positive scrolls up.
    Scroll(i32),
    KeyChord(String),
    /// Terminal: the loop exits after this frame.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
}

/// Keys a chord may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyToken {
    Ctrl,
    Alt,
    Shift,
    Super,
    Tab,
    Esc,
    Minus,
    Equal,
    Q,
    W,
    F4,
}

fn map_token(tok: &str) -> Result<KeyToken, ActuationError> {
    let k = match tok {
        "CTRL" | "CONTROL" => KeyToken::Ctrl,
        "ALT" => KeyToken::Alt,
        "SHIFT" => KeyToken::Shift,
        "SUPER" | "META" | "WIN" => KeyToken::Super,
        "TAB" => KeyToken::Tab,
        "ESC" | "ESCAPE" => KeyToken::Esc,
        "MINUS" | "-" => KeyToken::Minus,
        "EQUAL" | "=" => KeyToken::Equal,
        "Q" => KeyToken::Q,
        "W" => KeyToken::W,
        "F4" => KeyToken::F4,
        other => return Err(ActuationError::UnsupportedKey(other.to_string())),
    };
    Ok(k)
}

/// Parse a chord like "CTRL+W" or a single "TAB".
pub fn parse_chord(chord: &str) -> Result<Vec<KeyToken>, ActuationError> {
    let keys = chord
        .split('+')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .map(|s| map_token(&s))
        .collect::<Result<Vec<_>, _>>()?;
    if keys.is_empty() {
        return Err(ActuationError::EmptyChord);
    }
    Ok(keys)
}

/// The OS input-injection collaborator.
pub trait InputSink {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;
    fn button(&mut self, button: Button, pressed: bool) -> Result<()>;
    fn scroll_vertical(&mut self, steps: i32) -> Result<()>;
    fn key_chord(&mut self, keys: &[KeyToken]) -> Result<()>;

    fn click(&mut self, button: Button) -> Result<()> {
        self.button(button, true)?;
        self.button(button, false)
    }
}

/// Logs actions instead of injecting them (`--dry-run`).
#[derive(Debug, Default)]
pub struct NoopSink;

impl InputSink for NoopSink {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        debug!("dry-run: move to ({x}, {y})");
        Ok(())
    }
    fn button(&mut self, button: Button, pressed: bool) -> Result<()> {
        info!(
            "dry-run: {button:?} {}",
            if pressed { "down" } else { "up" }
        );
        Ok(())
    }
    fn scroll_vertical(&mut self, steps: i32) -> Result<()> {
        info!("dry-run: scroll {steps}");
        Ok(())
    }
    fn key_chord(&mut self, keys: &[KeyToken]) -> Result<()> {
        info!("dry-run: key chord {keys:?}");
        Ok(())
    }
}

pub struct UinputSink {
    screen: Screen,
    #[allow(dead_code)]
    linux: Option<Box<LinuxUinput>>,
}

impl UinputSink {
    pub fn new(screen: Screen) -> Result<Self> {
        #[cfg(target_os = "linux")]
        {
            let dev = LinuxUinput::create(screen)?;
            return Ok(Self {
                screen,
                linux: Some(Box::new(dev)),
            });
        }
        #[allow(unreachable_code)]
        {
            warn!("uinput not available; running in NO-OP mode");
            Ok(Self {
                screen,
                linux: None,
            })
        }
    }

    #[allow(unused_variables)]
    fn with_dev(
        &mut self,
        f: impl FnOnce(&mut LinuxUinput) -> Result<(), ActuationError>,
    ) -> Result<()> {
        #[cfg(target_os = "linux")]
        if let Some(dev) = self.linux.as_mut() {
            f(dev)?;
        }
        Ok(())
    }
}

impl InputSink for UinputSink {
    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        let x = x.clamp(0, self.screen.width.saturating_sub(1) as i32);
        let y = y.clamp(0, self.screen.height.saturating_sub(1) as i32);
        self.with_dev(|dev| dev.move_abs(x, y))
    }

    fn button(&mut self, button: Button, pressed: bool) -> Result<()> {
        self.with_dev(|dev| dev.button(button, pressed))
    }

    fn scroll_vertical(&mut self, steps: i32) -> Result<()> {
        self.with_dev(|dev| dev.scroll_vertical(steps))
    }

    fn key_chord(&mut self, keys: &[KeyToken]) -> Result<()> {
        self.with_dev(|dev| {
            // press in order
            for k in keys {
                dev.key_send(*k, 1)?;
            }
            dev.sync()?;
            // release in reverse
            for k in keys.iter().rev() {
                dev.key_send(*k, 0)?;
            }
            dev.sync()
        })
    }
}

#[cfg(target_os = "linux")]
fn uinput_key(tok: KeyToken) -> uinput::event::keyboard::Key {
    use uinput::event::keyboard::Key as K;
    match tok {
        KeyToken::Ctrl => K::LeftControl,
        KeyToken::Alt => K::LeftAlt,
        KeyToken::Shift => K::LeftShift,
        KeyToken::Super => K::LeftMeta,
        KeyToken::Tab => K::Tab,
        KeyToken::Esc => K::Esc,
        KeyToken::Minus => K::Minus,
        KeyToken::Equal => K::Equal,
        KeyToken::Q => K::Q,
        KeyToken::W => K::W,
        KeyToken::F4 => K::F4,
    }
}

#[cfg(target_os = "linux")]
struct LinuxUinput {
    dev: uinput::device::Device,
}

#[cfg(not(target_os = "linux"))]
struct LinuxUinput;

#[cfg(not(target_os = "linux"))]
impl LinuxUinput {
    fn move_abs(&mut self, _x: i32, _y: i32) -> Result<(), ActuationError> {
        Ok(())
    }
    fn button(&mut self, _b: Button, _pressed: bool) -> Result<(), ActuationError> {
        Ok(())
    }
    fn scroll_vertical(&mut self, _steps: i32) -> Result<(), ActuationError> {
        Ok(())
    }
    fn key_send(&mut self, _k: KeyToken, _val: i32) -> Result<(), ActuationError> {
        Ok(())
    }
    fn sync(&mut self) -> Result<(), ActuationError> {
        Ok(())
    }
}

#[cfg(target_os = "linux")]
impl LinuxUinput {
    fn create(screen: Screen) -> Result<Self, ActuationError> {
        use uinput::event::{absolute, controller::Mouse, keyboard, relative};

        let dev = uinput::default()?
            .name("Gazectl Virtual Pointer")?
            // absolute pointer spanning the screen
            .event(absolute::Position::X)?
            .min(0)
            .max(screen.width.saturating_sub(1) as i32)
            .event(absolute::Position::Y)?
            .min(0)
            .max(screen.height.saturating_sub(1) as i32)
            .event(relative::Wheel::Vertical)?
            // mouse buttons
            .event(Mouse::Left)?
            .event(Mouse::Right)?
            // keys for chords
            .event(keyboard::Key::LeftControl)?
            .event(keyboard::Key::LeftAlt)?
            .event(keyboard::Key::LeftShift)?
            .event(keyboard::Key::LeftMeta)?
            .event(keyboard::Key::Tab)?
            .event(keyboard::Key::Esc)?
            .event(keyboard::Key::Minus)?
            .event(keyboard::Key::Equal)?
            .event(keyboard::Key::Q)?
            .event(keyboard::Key::W)?
            .event(keyboard::Key::F4)?
            .create()?;

        info!(
            "uinput: created virtual pointer ({}x{})",
            screen.width, screen.height
        );
        Ok(Self { dev })
    }

    fn sync(&mut self) -> Result<(), ActuationError> {
        self.dev.synchronize()?;
        Ok(())
    }

    fn key_send(&mut self, key: KeyToken, val: i32) -> Result<(), ActuationError> {
        self.dev.send(uinput_key(key), val)?;
        Ok(())
    }

    fn move_abs(&mut self, x: i32, y: i32) -> Result<(), ActuationError> {
        use uinput::event::absolute::Position;
        self.dev.send(Position::X, x)?;
        self.dev.send(Position::Y, y)?;
        self.sync()
    }

    fn button(&mut self, button: Button, pressed: bool) -> Result<(), ActuationError> {
        use uinput::event::controller::Mouse;
        let b = match button {
            Button::Left => Mouse::Left,
            Button::Right => Mouse::Right,
        };
        self.dev.send(b, i32::from(pressed))?;
        self.sync()
    }

    fn scroll_vertical(&mut self, steps: i32) -> Result<(), ActuationError> {
        use uinput::event::relative::Wheel;
        self.dev.send(Wheel::Vertical, steps)?;
        self.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chords() {
        assert_eq!(
            parse_chord("ctrl + w").unwrap(),
            vec![KeyToken::Ctrl, KeyToken::W]
        );
        assert_eq!(parse_chord("TAB").unwrap(), vec![KeyToken::Tab]);
        assert!(matches!(
            parse_chord("CTRL+NOPE"),
            Err(ActuationError::UnsupportedKey(k)) if k == "NOPE"
        ));
        assert!(matches!(parse_chord(" + "), Err(ActuationError::EmptyChord)));
    }
}
