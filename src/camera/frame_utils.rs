//! Frame conversion and transformation utilities.

use image::imageops::{self, FilterType};
use image::RgbImage;

use super::types::{Frame, Resolution};

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let bpp = frame.bytes_per_pixel();

    for y in 0..height {
        let row_start = y * width * bpp;
        let row = &mut frame.data[row_start..row_start + width * bpp];

        // Swap pixels from left and right
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}

/// View a frame as an `RgbImage`.
///
/// Returns `None` if the buffer does not match the frame dimensions.
pub fn to_rgb_image(frame: &Frame) -> Option<RgbImage> {
    RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
}

/// Scale a frame to exactly `target`, cropping the centre so the aspect
/// ratio is preserved (the still fills the raster the way the live feed
/// fills its box).
pub fn resize_to(frame: &Frame, target: Resolution) -> Option<RgbImage> {
    let image = to_rgb_image(frame)?;
    if frame.width == 0 || frame.height == 0 || target.width == 0 || target.height == 0 {
        return None;
    }
    if frame.resolution() == target {
        return Some(image);
    }

    // Largest centred window with the target aspect ratio
    let (src_w, src_h) = (frame.width as u64, frame.height as u64);
    let (dst_w, dst_h) = (target.width as u64, target.height as u64);
    let (crop_w, crop_h) = if src_w * dst_h > src_h * dst_w {
        ((src_h * dst_w / dst_h).max(1), src_h)
    } else {
        (src_w, (src_w * dst_h / dst_w).max(1))
    };
    let x = ((src_w - crop_w) / 2) as u32;
    let y = ((src_h - crop_h) / 2) as u32;

    let cropped = imageops::crop_imm(&image, x, y, crop_w as u32, crop_h as u32).to_image();
    Some(imageops::resize(
        &cropped,
        target.width,
        target.height,
        FilterType::Triangle,
    ))
}
