use anyhow::Result;
use log::{debug, trace};

use crate::actions::{Action, Button, InputSink, parse_chord};

pub fn dispatch_action(action: &Action, sink: &mut dyn InputSink) -> Result<()> {
    if matches!(action, Action::MoveTo { .. }) {
        trace!("dispatch {action:?}");
    } else {
        debug!("dispatch {action:?}");
    }
    match action {
        Action::MoveTo { x, y } => sink.move_to(x.round() as i32, y.round() as i32),
        Action::MouseDown => sink.button(Button::Left, true),
        Action::MouseUp => sink.button(Button::Left, false),
        Action::Click => sink.click(Button::Left),
        Action::DoubleClick => {
            sink.click(Button::Left)?;
            sink.click(Button::Left)
        }
        Action::RightClick => sink.click(Button::Right),
        Action::Scroll(amount) => sink.scroll_vertical(*amount),
        Action::KeyChord(chord) => {
            let keys = parse_chord(chord)?;
            sink.key_chord(&keys)
        }
        // nothing to inject; the loop halts on the frame's flow
        Action::Shutdown => Ok(()),
    }
}
