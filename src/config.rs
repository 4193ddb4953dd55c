use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::actions::parse_chord;
use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Thresholds {
    /// Eye openness below which an eye counts as closed.
    pub blink: f64,
    pub blink_cooldown_ms: u64,
    pub blink_window_ms: u64,
    pub shutdown_dwell_ms: u64,
    pub scroll_cooldown_ms: u64,
    pub smooth_alpha: f64,
    /// Consecutive RightClosed frames required before selection starts.
    /// 1 means level-triggered with no hysteresis.
    #[serde(default = "one")]
    pub selection_min_frames: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Classify the count once the oldest blink of the episode ages out.
    #[default]
    Settled,
    /// Classify after every frame; any nonzero count fires.
    Immediate,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlinkSettings {
    #[serde(default)]
    pub dispatch: DispatchPolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrollSettings {
    pub dead_zone_top: f64,
    pub dead_zone_bottom: f64,
    pub up_amount: i32,
    pub down_amount: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Screen {
    pub width: u32,
    pub height: u32,
}

impl Screen {
    /// Parse a `WIDTHxHEIGHT` string such as `2560x1440`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ConfigError::Invalid(format!("screen must be WxH, got '{s}'")))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bad screen width '{w}'")))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bad screen height '{h}'")))?;
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LandmarkIndices {
    pub left_eye: [usize; 2],
    pub right_eye: [usize; 2],
    pub iris: usize,
    #[serde(default)]
    pub mirror_x: bool,
}

impl LandmarkIndices {
    fn all(&self) -> [usize; 5] {
        let [lt, lb] = self.left_eye;
        let [rt, rb] = self.right_eye;
        [lt, lb, rt, rb, self.iris]
    }

    /// Smallest face mesh that contains every configured index.
    pub fn required_mesh_len(&self) -> usize {
        self.all().into_iter().max().unwrap_or(0) + 1
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloseWindow {
    #[serde(default)]
    pub enabled: bool,
    pub chord: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub blink: BlinkSettings,
    pub scroll: ScrollSettings,
    pub screen: Screen,
    pub landmarks: LandmarkIndices,
    pub close_window: CloseWindow,
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

/// `~/.config/gazectl/profile.toml`; read if present, never written.
pub fn user_profile_path() -> Option<PathBuf> {
    UserDirs::new().map(|d| {
        d.home_dir()
            .join(".config")
            .join("gazectl")
            .join("profile.toml")
    })
}

impl Profile {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(default_profile_text())
    }

    pub fn from_toml(txt: &str) -> Result<Self, ConfigError> {
        let profile: Profile = toml::from_str(txt)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&txt)
    }

    /// Explicit path, else the user profile if it exists, else the builtin.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = explicit {
            info!("loading profile from {}", p.display());
            return Self::from_path(p);
        }
        if let Some(p) = user_profile_path().filter(|p| p.exists()) {
            info!("loading profile from {}", p.display());
            return Self::from_path(&p);
        }
        info!("using builtin default profile");
        Self::builtin()
    }

    pub fn name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or("unnamed")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let th = &self.thresholds;
        if !(th.blink > 0.0 && th.blink.is_finite()) {
            return Err(invalid("thresholds.blink must be a positive number"));
        }
        if th.blink_cooldown_ms == 0
            || th.blink_window_ms == 0
            || th.shutdown_dwell_ms == 0
            || th.scroll_cooldown_ms == 0
        {
            return Err(invalid("thresholds must be positive durations"));
        }
        if !(th.smooth_alpha > 0.0 && th.smooth_alpha <= 1.0) {
            return Err(invalid("thresholds.smooth_alpha must be in (0,1]"));
        }
        if th.selection_min_frames == 0 {
            return Err(invalid("thresholds.selection_min_frames must be >= 1"));
        }

        let sc = &self.scroll;
        let unit = 0.0..=1.0;
        if !unit.contains(&sc.dead_zone_top) || !unit.contains(&sc.dead_zone_bottom) {
            return Err(invalid("scroll dead zone bounds must be in [0,1]"));
        }
        if sc.dead_zone_top >= sc.dead_zone_bottom {
            return Err(invalid("scroll.dead_zone_top must be less than dead_zone_bottom"));
        }

        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(invalid("screen size must be non-zero"));
        }

        let mut idx = self.landmarks.all();
        idx.sort_unstable();
        if idx.windows(2).any(|w| w[0] == w[1]) {
            return Err(invalid("landmarks indices must all be distinct"));
        }

        if self.close_window.enabled {
            parse_chord(&self.close_window.chord)
                .map_err(|e| invalid(&format!("close_window.chord: {e}")))?;
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}
