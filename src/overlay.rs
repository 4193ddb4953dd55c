//! Visualization sinks. They only ever see a [`ControlView`] copy.

use anyhow::Result;
use log::info;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::control::{ControlMode, ControlView, SelectionState};

pub trait Visualizer {
    fn render(&mut self, view: &ControlView) -> Result<()>;
}

/// Logs the mode labels an on-screen overlay would show, on change only.
#[derive(Debug, Default)]
pub struct LogOverlay {
    last: Option<(ControlMode, SelectionState)>,
}

impl Visualizer for LogOverlay {
    fn render(&mut self, view: &ControlView) -> Result<()> {
        let labels = (view.mode, view.selection);
        if self.last == Some(labels) {
            return Ok(());
        }
        if self.last.is_some() || labels != (ControlMode::Active, SelectionState::Idle) {
            match labels {
                (ControlMode::Paused, _) => info!("[overlay] PAUSED"),
                (ControlMode::Active, SelectionState::Selecting) => info!("[overlay] SELECTING"),
                (ControlMode::Active, SelectionState::Idle) => info!("[overlay] tracking"),
            }
        }
        self.last = Some(labels);
        Ok(())
    }
}

/// One JSON object per frame for an external renderer.
pub struct JsonOverlay<W: Write> {
    out: W,
}

impl<W: Write> JsonOverlay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonOverlay<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> Visualizer for JsonOverlay<W> {
    fn render(&mut self, view: &ControlView) -> Result<()> {
        serde_json::to_writer(&mut self.out, view)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlState;
    use crate::config::Profile;

    #[test]
    fn json_overlay_writes_one_line_per_frame() {
        let p = Profile::builtin().unwrap();
        let st = ControlState::new(&p, 0);
        let mut ov = JsonOverlay::new(Vec::new());
        ov.render(&st.view()).unwrap();
        ov.render(&st.view()).unwrap();
        let text = String::from_utf8(ov.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(v["mode"], "active");
        assert_eq!(v["selection"], "idle");
        assert_eq!(v["blink_count"], 0);
        assert_eq!(v["dead_zone"][0], 0.35);
    }

    #[test]
    fn log_overlay_tracks_label_changes() {
        let p = Profile::builtin().unwrap();
        let st = ControlState::new(&p, 0);
        let mut view = st.view();
        let mut ov = LogOverlay::default();
        ov.render(&view).unwrap();
        view.mode = ControlMode::Paused;
        ov.render(&view).unwrap();
        assert_eq!(ov.last, Some((ControlMode::Paused, SelectionState::Idle)));
    }
}
