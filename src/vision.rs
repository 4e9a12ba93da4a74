use crate::error::{EngineError, EngineResult};
use image::RgbaImage;
use screenshots::Screen;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A flat color with a per-channel tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorSpec {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub tolerance: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Maximum ratio (0-1) of mismatched pixels allowed for a detection.
    #[serde(default = "default_max_diff_ratio")]
    pub max_diff_ratio: f64,
    /// Perceptual per-pixel sensitivity (0-1). Lower demands closer matches.
    #[serde(default = "default_pixel_threshold")]
    pub pixel_threshold: f64,
}

fn default_max_diff_ratio() -> f64 {
    0.1
}

fn default_pixel_threshold() -> f64 {
    0.1
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_diff_ratio: default_max_diff_ratio(),
            pixel_threshold: default_pixel_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl MatchResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            x: None,
            y: None,
            score: None,
        }
    }

    fn at(x: i32, y: i32, score: Option<f64>) -> Self {
        Self {
            found: true,
            x: Some(x),
            y: Some(y),
            score,
        }
    }
}

/// Capability boundary over the screen grabber. Returns RGBA row-major
/// buffers for a desktop-absolute region.
pub trait CaptureBackend: Send {
    fn grab_region(&mut self, region: &ScreenRegion) -> EngineResult<RgbaImage>;
}

pub type SharedCapture = Arc<Mutex<dyn CaptureBackend>>;

/// System grabber backed by the `screenshots` crate.
pub struct ScreenCapture;

impl CaptureBackend for ScreenCapture {
    fn grab_region(&mut self, region: &ScreenRegion) -> EngineResult<RgbaImage> {
        if region.is_empty() {
            return Err(EngineError::InvalidSettings(
                "capture region has zero area".into(),
            ));
        }
        let screen = Screen::from_point(region.x, region.y)
            .map_err(|e| EngineError::Capture(e.to_string()))?;
        screen
            .capture_area(
                region.x - screen.display_info.x,
                region.y - screen.display_info.y,
                region.width,
                region.height,
            )
            .map_err(|e| EngineError::Capture(e.to_string()))
    }
}

/// Scan `region` row-major for the first pixel whose channels are all within
/// `color.tolerance` of the target. Coordinates in the result are absolute.
pub fn find_color(
    capture: &mut dyn CaptureBackend,
    region: &ScreenRegion,
    color: &ColorSpec,
) -> EngineResult<MatchResult> {
    if region.is_empty() {
        return Ok(MatchResult::not_found());
    }

    let buffer = capture.grab_region(region)?;
    let tolerance = i16::from(color.tolerance);

    for (y, row) in buffer.rows().enumerate() {
        for (x, pixel) in row.enumerate() {
            let dr = (i16::from(pixel[0]) - i16::from(color.r)).abs();
            let dg = (i16::from(pixel[1]) - i16::from(color.g)).abs();
            let db = (i16::from(pixel[2]) - i16::from(color.b)).abs();
            if dr <= tolerance && dg <= tolerance && db <= tolerance {
                return Ok(MatchResult::at(region.x + x as i32, region.y + y as i32, None));
            }
        }
    }

    Ok(MatchResult::not_found())
}

/// Locate a reference image inside `region` with an exhaustive sliding-window
/// scan. The first window (row-major, so ties resolve top-left) whose
/// perceptual diff ratio is within `options.max_diff_ratio` wins and scores
/// `1 - diff_ratio`.
///
/// Complexity is O(region area x template area); deliberately simple in
/// favour of correctness and portability.
pub fn find_image(
    capture: &mut dyn CaptureBackend,
    region: &ScreenRegion,
    template_path: &Path,
    options: &MatchOptions,
) -> EngineResult<MatchResult> {
    if region.is_empty() {
        return Ok(MatchResult::not_found());
    }

    let template = load_template(template_path)?;
    let screenshot = capture.grab_region(region)?;

    let (region_w, region_h) = screenshot.dimensions();
    let (template_w, template_h) = template.dimensions();

    if template_w == 0 || template_h == 0 || template_w > region_w || template_h > region_h {
        return Ok(MatchResult::not_found());
    }

    let max_delta = 35215.0 * options.pixel_threshold * options.pixel_threshold;
    let template_area = f64::from(template_w) * f64::from(template_h);

    for offset_y in 0..=(region_h - template_h) {
        for offset_x in 0..=(region_w - template_w) {
            let mut mismatched = 0u64;
            for ty in 0..template_h {
                for tx in 0..template_w {
                    let screen_px = screenshot.get_pixel(offset_x + tx, offset_y + ty);
                    let template_px = template.get_pixel(tx, ty);
                    if pixel_delta(screen_px.0, template_px.0) > max_delta {
                        mismatched += 1;
                    }
                }
            }

            let diff_ratio = mismatched as f64 / template_area;
            if diff_ratio <= options.max_diff_ratio {
                return Ok(MatchResult::at(
                    region.x + offset_x as i32,
                    region.y + offset_y as i32,
                    Some(1.0 - diff_ratio),
                ));
            }
        }
    }

    Ok(MatchResult::not_found())
}

fn load_template(path: &Path) -> EngineResult<RgbaImage> {
    if !path.exists() {
        return Err(EngineError::TemplateNotFound(path.to_path_buf()));
    }
    let image = image::open(path).map_err(|e| EngineError::Capture(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Perceptual distance between two RGBA pixels in YIQ space. The maximum
/// possible delta is 35215, so `35215 * threshold^2` is the mismatch cutoff.
fn pixel_delta(a: [u8; 4], b: [u8; 4]) -> f64 {
    let a = blend_to_white(a);
    let b = blend_to_white(b);

    let dy = rgb2y(a) - rgb2y(b);
    let di = rgb2i(a) - rgb2i(b);
    let dq = rgb2q(a) - rgb2q(b);

    0.5053 * dy * dy + 0.299 * di * di + 0.1957 * dq * dq
}

fn blend_to_white([r, g, b, a]: [u8; 4]) -> [f64; 3] {
    let alpha = f64::from(a) / 255.0;
    let blend = |c: u8| 255.0 + (f64::from(c) - 255.0) * alpha;
    [blend(r), blend(g), blend(b)]
}

fn rgb2y([r, g, b]: [f64; 3]) -> f64 {
    r * 0.298_895_31 + g * 0.586_622_47 + b * 0.114_482_23
}

fn rgb2i([r, g, b]: [f64; 3]) -> f64 {
    r * 0.595_977_99 - g * 0.274_176_10 - b * 0.321_801_89
}

fn rgb2q([r, g, b]: [f64; 3]) -> f64 {
    r * 0.211_470_17 - g * 0.522_617_11 + b * 0.311_146_94
}
