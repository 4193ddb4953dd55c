//! Frame acquisition: one JSON object per line from the external landmark
//! extractor.
//!
//! ```text
//! {"t_ms": 1200, "face": {"left_eye": {"top": [0.4, 0.38], "bottom": [0.4, 0.40]},
//!                         "right_eye": {"top": [0.6, 0.38], "bottom": [0.6, 0.40]},
//!                         "iris": [0.41, 0.39]}}
//! {"t_ms": 1233, "face": {"mesh": [[0.5, 0.5, 0.0], ...]}}
//! {"t_ms": 1266, "face": null}
//! ```
//!
//! `t_ms` is optional; frames without it are stamped from a monotonic clock.

use anyhow::{Result, anyhow};
use log::info;
use serde::Deserialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    time::Instant,
};

use crate::config::LandmarkIndices;
use crate::signal::{EyeLandmarks, FaceLandmarks, FrameSample, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    Frame(FrameSample),
    /// A frame arrived but no face was detected in it.
    NoFace { timestamp_ms: u64 },
}

impl Acquired {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Acquired::Frame(sample) => sample.timestamp_ms,
            Acquired::NoFace { timestamp_ms } => *timestamp_ms,
        }
    }
}

pub trait FrameSource {
    /// `Ok(None)` is end of stream. Errors are acquisition failures.
    fn next_frame(&mut self) -> Result<Option<Acquired>>;
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    t_ms: Option<u64>,
    #[serde(default)]
    face: Option<RawFace>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFace {
    Named {
        left_eye: RawEye,
        right_eye: RawEye,
        iris: [f64; 2],
    },
    Mesh {
        mesh: Vec<Vec<f64>>,
    },
}

#[derive(Debug, Deserialize)]
struct RawEye {
    top: [f64; 2],
    bottom: [f64; 2],
}

fn pt(xy: [f64; 2]) -> Point {
    Point::new(xy[0], xy[1])
}

fn mesh_point(mesh: &[Vec<f64>], idx: usize) -> Result<Point> {
    match mesh.get(idx).map(Vec::as_slice) {
        Some([x, y, ..]) => Ok(Point::new(*x, *y)),
        Some(_) => Err(anyhow!("mesh landmark {idx} has fewer than 2 coordinates")),
        None => Err(anyhow!(
            "mesh has {} landmarks, index {idx} missing (iris requires refined landmarks)",
            mesh.len()
        )),
    }
}

impl RawFace {
    fn resolve(&self, idx: &LandmarkIndices) -> Result<FaceLandmarks> {
        let mut face = match self {
            RawFace::Named {
                left_eye,
                right_eye,
                iris,
            } => FaceLandmarks {
                left_eye: EyeLandmarks {
                    top: pt(left_eye.top),
                    bottom: pt(left_eye.bottom),
                },
                right_eye: EyeLandmarks {
                    top: pt(right_eye.top),
                    bottom: pt(right_eye.bottom),
                },
                iris: pt(*iris),
            },
            RawFace::Mesh { mesh } => FaceLandmarks {
                left_eye: EyeLandmarks {
                    top: mesh_point(mesh, idx.left_eye[0])?,
                    bottom: mesh_point(mesh, idx.left_eye[1])?,
                },
                right_eye: EyeLandmarks {
                    top: mesh_point(mesh, idx.right_eye[0])?,
                    bottom: mesh_point(mesh, idx.right_eye[1])?,
                },
                iris: mesh_point(mesh, idx.iris)?,
            },
        };
        if idx.mirror_x {
            face.iris.x = 1.0 - face.iris.x;
        }
        Ok(face)
    }
}

/// Reads landmark frames as JSON Lines from any buffered reader.
pub struct JsonLinesSource<R> {
    reader: R,
    indices: LandmarkIndices,
    clock: Instant,
    line: String,
    line_no: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, indices: LandmarkIndices) -> Self {
        Self {
            reader,
            indices,
            clock: Instant::now(),
            line: String::new(),
            line_no: 0,
        }
    }

    fn decode(&self, line: &str) -> Result<Acquired> {
        let raw: RawFrame = serde_json::from_str(line)
            .map_err(|e| anyhow!("line {}: bad frame: {e}", self.line_no))?;
        let timestamp_ms = raw
            .t_ms
            .unwrap_or_else(|| self.clock.elapsed().as_millis() as u64);
        match raw.face {
            None => Ok(Acquired::NoFace { timestamp_ms }),
            Some(face) => {
                let face = face
                    .resolve(&self.indices)
                    .map_err(|e| anyhow!("line {}: {e}", self.line_no))?;
                Ok(Acquired::Frame(FrameSample::from_landmarks(
                    timestamp_ms,
                    &face,
                )))
            }
        }
    }
}

impl<R: BufRead> FrameSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<Acquired>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = self.line.trim();
            // blank lines are keep-alives, not frames
            if trimmed.is_empty() {
                continue;
            }
            return self.decode(trimmed).map(Some);
        }
    }
}

/// Open `-` as stdin, anything else as a file.
pub fn open(path: &str, indices: LandmarkIndices) -> Result<Box<dyn FrameSource>> {
    info!(
        "mesh input needs at least {} landmarks (refined iris points)",
        indices.required_mesh_len()
    );
    if path == "-" {
        let stdin = BufReader::new(io::stdin());
        return Ok(Box::new(JsonLinesSource::new(stdin, indices)));
    }
    let f = File::open(Path::new(path)).map_err(|e| anyhow!("failed to open {path}: {e}"))?;
    Ok(Box::new(JsonLinesSource::new(BufReader::new(f), indices)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    fn indices() -> LandmarkIndices {
        Profile::builtin().unwrap().landmarks
    }

    fn source(text: &str) -> JsonLinesSource<&[u8]> {
        JsonLinesSource::new(text.as_bytes(), indices())
    }

    #[test]
    fn decodes_named_points() {
        let mut src = source(
            r#"{"t_ms": 10, "face": {"left_eye": {"top": [0.4, 0.38], "bottom": [0.4, 0.40]}, "right_eye": {"top": [0.6, 0.38], "bottom": [0.6, 0.39]}, "iris": [0.41, 0.39]}}"#,
        );
        let Some(Acquired::Frame(s)) = src.next_frame().unwrap() else {
            panic!("expected a frame");
        };
        assert_eq!(s.timestamp_ms, 10);
        assert!((s.left_height - 0.02).abs() < 1e-9);
        assert!((s.right_height - 0.01).abs() < 1e-9);
        assert_eq!(s.iris, Point::new(0.41, 0.39));
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn null_face_is_no_signal() {
        let mut src = source("{\"t_ms\": 5, \"face\": null}\n\n{\"t_ms\": 6}\n");
        assert_eq!(
            src.next_frame().unwrap(),
            Some(Acquired::NoFace { timestamp_ms: 5 })
        );
        assert_eq!(
            src.next_frame().unwrap(),
            Some(Acquired::NoFace { timestamp_ms: 6 })
        );
        assert_eq!(src.next_frame().unwrap(), None);
    }

    #[test]
    fn resolves_mesh_with_face_mesh_indices() {
        let mut mesh = vec![vec![0.0, 0.0, 0.0]; 478];
        mesh[159] = vec![0.40, 0.30, 0.0];
        mesh[145] = vec![0.40, 0.33, 0.0];
        mesh[386] = vec![0.60, 0.30, 0.0];
        mesh[374] = vec![0.60, 0.305, 0.0];
        mesh[468] = vec![0.45, 0.31, 0.0];
        let line = serde_json::json!({"t_ms": 1, "face": {"mesh": mesh}}).to_string();
        let mut src = source(&line);
        let Some(Acquired::Frame(s)) = src.next_frame().unwrap() else {
            panic!("expected a frame");
        };
        assert!((s.left_height - 0.03).abs() < 1e-9);
        assert!((s.right_height - 0.005).abs() < 1e-9);
        assert_eq!(s.iris, Point::new(0.45, 0.31));
    }

    #[test]
    fn short_mesh_is_an_acquisition_error() {
        let line = serde_json::json!({"face": {"mesh": [[0.1, 0.2]]}}).to_string();
        assert!(source(&line).next_frame().is_err());
    }

    #[test]
    fn garbage_is_an_acquisition_error() {
        assert!(source("not json\n").next_frame().is_err());
    }

    #[test]
    fn mirror_flips_iris_x() {
        let mut idx = indices();
        idx.mirror_x = true;
        let line = r#"{"t_ms": 1, "face": {"left_eye": {"top": [0, 0.3], "bottom": [0, 0.4]}, "right_eye": {"top": [0, 0.3], "bottom": [0, 0.4]}, "iris": [0.2, 0.5]}}"#;
        let mut src = JsonLinesSource::new(line.as_bytes(), idx);
        let Some(Acquired::Frame(s)) = src.next_frame().unwrap() else {
            panic!("expected a frame");
        };
        assert!((s.iris.x - 0.8).abs() < 1e-12);
    }
}
