//! Overlay logging to rerun: capture, landmarks, hand skeleton, card quad.

use std::io::Cursor;

use image::DynamicImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::RecordingStream;

use crate::detected_points::{HandLandmark, HandLandmarks};
use crate::geometry::landmark_to_pixel;
use crate::quad::Quad;

/// Bones drawn between landmarks, same topology as the detector's hand model.
pub const HAND_CONNECTIONS: [(HandLandmark, HandLandmark); 21] = {
    use HandLandmark::*;
    [
        (Wrist, ThumbCmc),
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        (Wrist, IndexMcp),
        (IndexMcp, IndexPip),
        (IndexPip, IndexDip),
        (IndexDip, IndexTip),
        (IndexMcp, MiddleMcp),
        (MiddleMcp, MiddlePip),
        (MiddlePip, MiddleDip),
        (MiddleDip, MiddleTip),
        (MiddleMcp, RingMcp),
        (RingMcp, RingPip),
        (RingPip, RingDip),
        (RingDip, RingTip),
        (RingMcp, PinkyMcp),
        (Wrist, PinkyMcp),
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

pub fn id_to_color(id: usize) -> rerun::Color {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    rerun::Color::from_unmultiplied_rgba(
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p2ds: &[(f32, f32)]) -> Vec<(f32, f32)> {
    p2ds.iter().map(|(x, y)| (*x + 0.5, *y + 0.5)).collect()
}

pub fn log_image_as_compressed(
    recording: &RecordingStream,
    topic: &str,
    img: &DynamicImage,
    format: image::ImageFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bytes: Vec<u8> = Vec::new();
    img.to_rgb8().write_to(&mut Cursor::new(&mut bytes), format)?;
    recording.log(
        format!("{}/image", topic),
        &rerun::EncodedImage::from_file_contents(bytes),
    )?;
    Ok(())
}

pub fn log_hand(
    recording: &RecordingStream,
    topic: &str,
    landmarks: &HandLandmarks,
    frame_side: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let px = |which: HandLandmark| {
        let p = landmark_to_pixel(&landmarks.get(which), frame_side);
        (p.x as f32, p.y as f32)
    };
    let (pts, labels): (Vec<_>, Vec<_>) = landmarks
        .iter()
        .map(|(which, _)| (px(which), format!("{:?}", which)))
        .unzip();
    let colors: Vec<_> = (0..pts.len()).map(id_to_color).collect();
    recording.log(
        format!("{}/landmarks", topic),
        &rerun::Points2D::new(rerun_shift(&pts))
            .with_colors(colors)
            .with_labels(labels)
            .with_radii([rerun::Radius::new_ui_points(3.0)]),
    )?;

    let bones: Vec<[[f32; 2]; 2]> = HAND_CONNECTIONS
        .iter()
        .map(|&(a, b)| {
            let (pa, pb) = (px(a), px(b));
            [[pa.0 + 0.5, pa.1 + 0.5], [pb.0 + 0.5, pb.1 + 0.5]]
        })
        .collect();
    recording.log(
        format!("{}/skeleton", topic),
        &rerun::LineStrips2D::new(bones)
            .with_colors([rerun::Color::from_rgb(0, 255, 0)]),
    )?;
    Ok(())
}

pub fn log_quad(
    recording: &RecordingStream,
    topic: &str,
    quad: &Quad,
) -> Result<(), Box<dyn std::error::Error>> {
    let c = quad.corners();
    let strip: [[f32; 2]; 5] = [0, 1, 2, 3, 0].map(|i| [c[i].x as f32 + 0.5, c[i].y as f32 + 0.5]);
    recording.log(
        format!("{}/card", topic),
        &rerun::LineStrips2D::new([strip]).with_colors([rerun::Color::from_rgb(255, 0, 0)]),
    )?;
    Ok(())
}
