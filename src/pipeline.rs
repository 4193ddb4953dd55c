use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use signal_hook::consts::{SIGINT, SIGTERM};

use crate::actions::{InputSink, NoopSink, UinputSink};
use crate::config::{Profile, Screen};
use crate::control::{ControlState, Flow, HaltReason, process_frame};
use crate::dispatch::dispatch_action;
use crate::overlay::{JsonOverlay, LogOverlay, Visualizer};
use crate::source::{self, Acquired, FrameSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    EndOfStream,
    /// A frame could not be obtained; handled like end of stream.
    AcquisitionFailed,
    Halted(HaltReason),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub input: String,
    pub screen: Option<Screen>,
    pub dry_run: bool,
    pub overlay: Option<PathBuf>,
}

/// Build the collaborators, drive the loop, then release everything in a
/// fixed order: overlay, input device, frame source.
pub fn run(opts: &RunOptions) -> Result<ExitReason> {
    let mut profile = Profile::load(opts.config.as_deref())?;
    if let Some(screen) = opts.screen {
        profile.screen = screen;
        profile.validate()?;
    }
    info!(
        "profile '{}', screen {}x{}, blink dispatch {:?}",
        profile.name(),
        profile.screen.width,
        profile.screen.height,
        profile.blink.dispatch
    );

    let cancel = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        // a second signal while the first is pending exits immediately
        signal_hook::flag::register_conditional_shutdown(sig, 1, Arc::clone(&cancel))?;
        signal_hook::flag::register(sig, Arc::clone(&cancel))?;
    }

    let mut source = source::open(&opts.input, profile.landmarks.clone())?;
    let mut sink: Box<dyn InputSink> = if opts.dry_run {
        warn!("dry run: actions are logged, not injected");
        Box::new(NoopSink)
    } else {
        Box::new(
            UinputSink::new(profile.screen)
                .context("failed to create uinput device (try `gazectl doctor` or --dry-run)")?,
        )
    };
    let mut overlay: Box<dyn Visualizer> = match &opts.overlay {
        Some(path) => Box::new(JsonOverlay::create(path)?),
        None => Box::new(LogOverlay::default()),
    };

    let result = run_loop(&profile, source.as_mut(), sink.as_mut(), overlay.as_mut(), &cancel);

    drop(overlay);
    drop(sink);
    drop(source);
    debug!("resources released");

    match &result {
        Ok(reason) => info!("control loop ended: {reason:?}"),
        Err(e) => error!("control loop aborted: {e:#}"),
    }
    result
}

/// One iteration per acquired frame until the stream ends, the controller
/// halts, the cancel flag is set, or actuation fails.
pub fn run_loop(
    profile: &Profile,
    source: &mut dyn FrameSource,
    sink: &mut dyn InputSink,
    overlay: &mut dyn Visualizer,
    cancel: &AtomicBool,
) -> Result<ExitReason> {
    // created on the first acquired frame so cooldowns start from stream time
    let mut state: Option<ControlState> = None;

    let outcome = loop {
        let acquired = match source.next_frame() {
            Ok(Some(a)) => a,
            Ok(None) => break Ok(ExitReason::EndOfStream),
            Err(e) => {
                warn!("frame acquisition failed: {e:#}");
                break Ok(ExitReason::AcquisitionFailed);
            }
        };

        let st = state.get_or_insert_with(|| ControlState::new(profile, acquired.timestamp_ms()));
        let mut flow = Flow::Continue;
        match acquired {
            Acquired::Frame(sample) => {
                let out = process_frame(st, profile, &sample);
                if let Err(e) = out
                    .actions
                    .iter()
                    .try_for_each(|a| dispatch_action(a, sink))
                {
                    break Err(e.context("actuation failed"));
                }
                flow = out.flow;
            }
            Acquired::NoFace { timestamp_ms } => st.note_no_face(timestamp_ms),
        }

        if let Err(e) = overlay.render(&st.view()) {
            warn!("overlay render failed: {e:#}");
        }

        if let Flow::Halt(reason) = flow {
            break Ok(ExitReason::Halted(reason));
        }
        if cancel.load(Ordering::Relaxed) {
            info!("cancelled");
            break Ok(ExitReason::Cancelled);
        }
    };

    // never leave the pointer button held
    if let Some(up) = state.as_mut().and_then(ControlState::release_selection) {
        info!("releasing held selection");
        if let Err(e) = dispatch_action(&up, sink) {
            error!("failed to release selection: {e:#}");
        }
    }

    outcome
}
