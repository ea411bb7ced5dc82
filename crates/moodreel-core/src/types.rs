use serde::{Deserialize, Serialize};
use thiserror::Error;

// BT.601 luma weights in 1/256 fixed point (the same weighting the
// pretrained classifiers were trained against).
const LUMA_R: u32 = 77;
const LUMA_G: u32 = 150;
const LUMA_B: u32 = 29;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty image payload")]
    Empty,
    #[error("unreadable image: {0}")]
    Unreadable(#[from] image::ImageError),
}

/// A decoded 3-channel color frame, owned by a single inference call.
pub struct ImageFrame {
    /// Interleaved RGB pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ImageFrame {
    /// Decode raw image bytes (JPEG, PNG, ...) into an RGB frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self {
            data: rgb.into_raw(),
            width,
            height,
        })
    }

    /// Build a frame from an already-interleaved RGB buffer.
    ///
    /// The buffer length must be exactly width * height * 3.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// Grayscale value of the pixel at (x, y).
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        let idx = ((y * self.width + x) * 3) as usize;
        let r = self.data[idx] as u32;
        let g = self.data[idx + 1] as u32;
        let b = self.data[idx + 2] as u32;
        ((r * LUMA_R + g * LUMA_G + b * LUMA_B) >> 8) as u8
    }

    /// Full-frame grayscale conversion.
    pub fn to_luma(&self) -> Vec<u8> {
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                gray.push(self.luma_at(x, y));
            }
        }
        gray
    }
}

/// Axis-aligned rectangle for a detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True if the box is non-degenerate and lies within a frame of the
    /// given dimensions.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self
                .x
                .checked_add(self.width)
                .is_some_and(|right| right <= frame_width)
            && self
                .y
                .checked_add(self.height)
                .is_some_and(|bottom| bottom <= frame_height)
    }
}

/// Emotion class inferred from a face crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
    Unknown,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unknown emotion: {0}")]
pub struct ParseEmotionError(String);

impl std::str::FromStr for Emotion {
    type Err = ParseEmotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "angry" => Ok(Emotion::Angry),
            "disgust" => Ok(Emotion::Disgust),
            "fear" => Ok(Emotion::Fear),
            "happy" => Ok(Emotion::Happy),
            "neutral" => Ok(Emotion::Neutral),
            "sad" => Ok(Emotion::Sad),
            "surprise" => Ok(Emotion::Surprise),
            "unknown" => Ok(Emotion::Unknown),
            other => Err(ParseEmotionError(other.to_string())),
        }
    }
}

/// Perceived gender inferred from a face crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pipeline's output record.
///
/// `confidence` is meaningful only for `emotion`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeResult {
    pub emotion: Emotion,
    pub age: u32,
    pub gender: Gender,
    pub confidence: f32,
}

impl AttributeResult {
    /// Record returned when no face is located; no classifier runs.
    pub fn no_face() -> Self {
        Self {
            emotion: Emotion::Unknown,
            age: 0,
            gender: Gender::Unknown,
            confidence: 0.0,
        }
    }

    /// Baseline record for a located face. Each adapter that runs and
    /// succeeds overwrites its own fields; the rest stand.
    pub fn defaults() -> Self {
        Self {
            emotion: Emotion::Neutral,
            age: 25,
            gender: Gender::Unknown,
            confidence: 0.85,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(r: u8, g: u8, b: u8, width: u32, height: u32) -> ImageFrame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..(width * height) {
            data.extend_from_slice(&[r, g, b]);
        }
        ImageFrame::from_rgb(data, width, height)
    }

    #[test]
    fn test_decode_empty_payload() {
        assert!(matches!(ImageFrame::decode(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_garbage_payload() {
        let result = ImageFrame::decode(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(result, Err(DecodeError::Unreadable(_))));
    }

    #[test]
    fn test_luma_gray_pixel_is_identity() {
        // For r == g == b the weighted sum must reproduce the input value
        // (up to fixed-point truncation).
        let frame = solid_frame(128, 128, 128, 4, 4);
        let y = frame.luma_at(0, 0);
        assert!((y as i32 - 128).abs() <= 1, "got {y}");
    }

    #[test]
    fn test_luma_green_dominates() {
        let green = solid_frame(0, 255, 0, 2, 2).luma_at(0, 0);
        let blue = solid_frame(0, 0, 255, 2, 2).luma_at(0, 0);
        let red = solid_frame(255, 0, 0, 2, 2).luma_at(0, 0);
        assert!(green > red);
        assert!(red > blue);
    }

    #[test]
    fn test_to_luma_length() {
        let frame = solid_frame(10, 20, 30, 7, 5);
        assert_eq!(frame.to_luma().len(), 35);
    }

    #[test]
    fn test_bbox_area() {
        let b = BoundingBox { x: 0, y: 0, width: 30, height: 40 };
        assert_eq!(b.area(), 1200);
    }

    #[test]
    fn test_bbox_fits_within() {
        let b = BoundingBox { x: 10, y: 10, width: 20, height: 20 };
        assert!(b.fits_within(30, 30));
        assert!(!b.fits_within(29, 30));
        assert!(!b.fits_within(30, 29));
    }

    #[test]
    fn test_bbox_degenerate_never_fits() {
        let b = BoundingBox { x: 0, y: 0, width: 0, height: 10 };
        assert!(!b.fits_within(100, 100));
    }

    #[test]
    fn test_no_face_record() {
        let r = AttributeResult::no_face();
        assert_eq!(r.emotion, Emotion::Unknown);
        assert_eq!(r.age, 0);
        assert_eq!(r.gender, Gender::Unknown);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_default_record() {
        let r = AttributeResult::defaults();
        assert_eq!(r.emotion, Emotion::Neutral);
        assert_eq!(r.age, 25);
        assert_eq!(r.gender, Gender::Unknown);
        assert!((r.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_attribute_result_serialization() {
        let json = serde_json::to_value(AttributeResult::no_face()).unwrap();
        assert_eq!(json["emotion"], "unknown");
        assert_eq!(json["age"], 0);
        assert_eq!(json["gender"], "unknown");
    }

    #[test]
    fn test_emotion_round_trip() {
        for s in ["angry", "disgust", "fear", "happy", "neutral", "sad", "surprise", "unknown"] {
            let e: Emotion = s.parse().unwrap();
            assert_eq!(e.as_str(), s);
        }
        assert!("bored".parse::<Emotion>().is_err());
    }
}
