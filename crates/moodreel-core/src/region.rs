//! Face region extraction and tensor preprocessing.
//!
//! Crops the located face to a grayscale sub-grid and resizes it into the
//! fixed NHWC layouts the two classifiers consume. Both consumers use the
//! same normalization rule; only the target size differs.

use crate::types::{BoundingBox, ImageFrame};
use ndarray::Array4;
use thiserror::Error;

/// Emotion classifier input edge (48×48 grayscale).
pub const EMOTION_INPUT_SIZE: u32 = 48;
/// Age/gender classifier input edge (128×128 grayscale).
pub const AGE_GENDER_INPUT_SIZE: u32 = 128;

const PIXEL_SCALE: f32 = 255.0;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("box {x},{y} {width}x{height} outside {frame_width}x{frame_height} frame")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
}

/// Grayscale crop of an [`ImageFrame`] to a face box. Read-only once built;
/// each classifier resizes its own tensor from it.
pub struct FaceRegion {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    /// Crop `frame` to `bbox`, converting only the box pixels to grayscale.
    pub fn crop(frame: &ImageFrame, bbox: &BoundingBox) -> Result<Self, RegionError> {
        if !bbox.fits_within(frame.width, frame.height) {
            return Err(RegionError::OutOfBounds {
                x: bbox.x,
                y: bbox.y,
                width: bbox.width,
                height: bbox.height,
                frame_width: frame.width,
                frame_height: frame.height,
            });
        }

        let mut data = Vec::with_capacity((bbox.width * bbox.height) as usize);
        for y in bbox.y..bbox.y + bbox.height {
            for x in bbox.x..bbox.x + bbox.width {
                data.push(frame.luma_at(x, y));
            }
        }

        Ok(Self {
            data,
            width: bbox.width,
            height: bbox.height,
        })
    }

    /// Resize to `target`×`target`, normalize to [0, 1], and lay out as the
    /// NHWC tensor (1, target, target, 1) the classifiers expect.
    pub fn to_tensor(&self, target: u32) -> Array4<f32> {
        let resized = resize_bilinear(&self.data, self.width, self.height, target, target);

        let size = target as usize;
        let mut tensor = Array4::<f32>::zeros((1, size, size, 1));
        for y in 0..size {
            for x in 0..size {
                tensor[[0, y, x, 0]] = resized[y * size + x] as f32 / PIXEL_SCALE;
            }
        }

        tensor
    }
}

/// Bilinear resize of a grayscale buffer.
fn resize_bilinear(src: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    let src_w = src_w as usize;
    let src_h = src_h as usize;
    let dst_w = dst_w as usize;
    let dst_h = dst_h as usize;

    let x_ratio = src_w as f32 / dst_w as f32;
    let y_ratio = src_h as f32 / dst_h as f32;

    let mut out = vec![0u8; dst_w * dst_h];
    for y in 0..dst_h {
        let src_y = (y as f32 + 0.5) * y_ratio - 0.5;
        let y0 = (src_y.floor() as i32).clamp(0, src_h as i32 - 1) as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

        for x in 0..dst_w {
            let src_x = (x as f32 + 0.5) * x_ratio - 0.5;
            let x0 = (src_x.floor() as i32).clamp(0, src_w as i32 - 1) as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

            let tl = src[y0 * src_w + x0] as f32;
            let tr = src[y0 * src_w + x1] as f32;
            let bl = src[y1 * src_w + x0] as f32;
            let br = src[y1 * src_w + x1] as f32;

            let val = tl * (1.0 - fx) * (1.0 - fy)
                + tr * fx * (1.0 - fy)
                + bl * (1.0 - fx) * fy
                + br * fx * fy;

            out[y * dst_w + x] = val.round().clamp(0.0, 255.0) as u8;
        }
    }

    out
}
