// ============================================================
// Layer 3 - Driving Sample Domain Types
// ============================================================
// One row of a driving log, and the fully loaded training
// example built from it.
//
// A driving log is a plain text file:
//
//   frame,speed,steering
//   frames/000001.rgb,12.5,-0.04
//   frames/000002.rgb,12.7,-0.02
//
// Each frame file holds one camera image as raw RGB bytes,
// row-major and channel-last: FRAME_HEIGHT x FRAME_WIDTH x 3.
//
// Reference: Rust Book §5 (Structs), §9 (Error Handling)

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Rows in a camera frame
pub const FRAME_HEIGHT: usize = 66;

/// Columns in a camera frame
pub const FRAME_WIDTH: usize = 200;

/// Colour channels in a camera frame (RGB)
pub const FRAME_CHANNELS: usize = 3;

/// Number of bytes in one raw frame file
pub const FRAME_LEN: usize = FRAME_HEIGHT * FRAME_WIDTH * FRAME_CHANNELS;

/// One parsed line of a driving log, before the frame is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrivingRecord {
    /// Path to the raw frame, as written in the log
    pub frame_path: String,

    /// Vehicle speed when the frame was captured
    pub speed: f32,

    /// Recorded steering command (the regression target)
    pub steering: f32,
}

impl DrivingRecord {
    /// Parse a `frame_path,speed,steering` line.
    ///
    /// Surrounding whitespace on each field is ignored.
    /// Extra trailing columns are rejected so a log written
    /// with a different layout fails loudly.
    pub fn from_csv_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [frame_path, speed, steering] = fields.as_slice() else {
            return Err(anyhow!(
                "expected 3 columns (frame,speed,steering), found {}",
                fields.len()
            ));
        };

        if frame_path.is_empty() {
            return Err(anyhow!("empty frame path"));
        }

        let speed: f32 = speed
            .parse()
            .with_context(|| format!("invalid speed '{speed}'"))?;
        let steering: f32 = steering
            .parse()
            .with_context(|| format!("invalid steering '{steering}'"))?;

        Ok(Self {
            frame_path: frame_path.to_string(),
            speed,
            steering,
        })
    }

    /// True for header rows such as `frame,speed,steering`
    pub fn is_header(line: &str) -> bool {
        let first = line.split(',').next().unwrap_or("").trim().to_ascii_lowercase();
        matches!(first.as_str(), "frame" | "frame_path")
    }
}

/// A training example: one frame plus its speed and steering label.
#[derive(Debug, Clone)]
pub struct DrivingSample {
    /// Raw RGB bytes, length FRAME_LEN, layout [H, W, C]
    pub frame: Vec<u8>,
    pub speed: f32,
    pub steering: f32,
}

impl DrivingSample {
    /// Build a sample, checking the frame has the expected size.
    pub fn new(frame: Vec<u8>, speed: f32, steering: f32) -> Result<Self> {
        if frame.len() != FRAME_LEN {
            return Err(anyhow!(
                "frame has {} bytes, expected {} ({}x{}x{})",
                frame.len(),
                FRAME_LEN,
                FRAME_HEIGHT,
                FRAME_WIDTH,
                FRAME_CHANNELS
            ));
        }
        Ok(Self { frame, speed, steering })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_line() {
        let r = DrivingRecord::from_csv_line(" frames/a.rgb , 12.5, -0.25 ").unwrap();
        assert_eq!(r.frame_path, "frames/a.rgb");
        assert_eq!(r.speed, 12.5);
        assert_eq!(r.steering, -0.25);
    }

    #[test]
    fn test_parse_rejects_wrong_column_count() {
        assert!(DrivingRecord::from_csv_line("a.rgb,1.0").is_err());
        assert!(DrivingRecord::from_csv_line("a.rgb,1.0,0.1,9").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        assert!(DrivingRecord::from_csv_line("a.rgb,fast,0.1").is_err());
        assert!(DrivingRecord::from_csv_line("a.rgb,1.0,left").is_err());
        assert!(DrivingRecord::from_csv_line(",1.0,0.1").is_err());
    }

    #[test]
    fn test_header_detection() {
        assert!(DrivingRecord::is_header("frame,speed,steering"));
        assert!(DrivingRecord::is_header("Frame_Path,Speed,Steering"));
        assert!(!DrivingRecord::is_header("frames/0001.rgb,1,2"));
        assert!(!DrivingRecord::is_header("img/0001.rgb,1,2"));
    }

    #[test]
    fn test_sample_checks_frame_size() {
        assert!(DrivingSample::new(vec![0; FRAME_LEN], 1.0, 0.0).is_ok());
        assert!(DrivingSample::new(vec![0; FRAME_LEN - 1], 1.0, 0.0).is_err());
    }
}
