use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

use super::frame::{PixelFormat, RawFrame};
use crate::error::FrameDecodeError;

/// MoveNet Thunder の入力サイズ
pub const MOVENET_INPUT_SIZE: u32 = 256;

/// RawFrame を MoveNet 用の入力テンソルに変換
///
/// - 各フォーマット -> RGB
/// - 256x256 にバイリニアでリサイズ（アスペクト比は保持しない）
/// - [1, 256, 256, 3] の f32 テンソルに変換 (0.0-255.0)
///
/// 正方形でないフレームは引き伸ばされるので、出力座標もその分歪む。
pub fn preprocess_for_movenet(frame: &RawFrame) -> Result<Array4<f32>, FrameDecodeError> {
    let rgb = to_rgb_image(frame)?;

    let resized = imageops::resize(
        &rgb,
        MOVENET_INPUT_SIZE,
        MOVENET_INPUT_SIZE,
        FilterType::Triangle,
    );

    let size = MOVENET_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, y, x, 0]] = pixel[0] as f32;
        tensor[[0, y, x, 1]] = pixel[1] as f32;
        tensor[[0, y, x, 2]] = pixel[2] as f32;
    }

    Ok(tensor)
}

/// フレームを RGB 画像に変換
pub fn to_rgb_image(frame: &RawFrame) -> Result<RgbImage, FrameDecodeError> {
    let (width, height) = (frame.width(), frame.height());
    let format = frame.format();
    let expected = match format.frame_len(width, height) {
        Some(len) => len,
        // 圧縮済みフレームはサイズが分からないのでデコーダに任せる
        None if format == PixelFormat::Encoded => {
            let decoded = image::load_from_memory(frame.data())?;
            return Ok(decoded.to_rgb8());
        }
        None => {
            return Err(FrameDecodeError::FrameTooLarge {
                format,
                width,
                height,
            })
        }
    };
    if width == 0 || height == 0 {
        return Err(FrameDecodeError::EmptyFrame { width, height });
    }
    let data = frame.data();
    if data.len() < expected {
        return Err(FrameDecodeError::BufferTooShort {
            format: frame.format(),
            width,
            height,
            expected,
            actual: data.len(),
        });
    }
    let data = &data[..expected];

    let rgb: Vec<u8> = match frame.format() {
        PixelFormat::Rgb8 => data.to_vec(),
        PixelFormat::Bgr8 => data
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
        PixelFormat::Rgba8 => data
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        PixelFormat::Gray8 => data.iter().flat_map(|&v| [v, v, v]).collect(),
        PixelFormat::I420 => i420_to_rgb(data, width as usize, height as usize),
        PixelFormat::Encoded => data.to_vec(),
    };

    // 長さは frame_len で確認済み
    RgbImage::from_raw(width, height, rgb).ok_or(FrameDecodeError::BufferTooShort {
        format: frame.format(),
        width,
        height,
        expected,
        actual: frame.data().len(),
    })
}

/// YUV 4:2:0 プレーナ -> RGB (BT.601 フルレンジ)
fn i420_to_rgb(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let chroma_w = width.div_ceil(2);
    let chroma_h = height.div_ceil(2);
    let (y_plane, rest) = data.split_at(width * height);
    let (u_plane, v_plane) = rest.split_at(chroma_w * chroma_h);

    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in 0..height {
        for col in 0..width {
            let y = y_plane[row * width + col] as f32;
            let ci = (row / 2) * chroma_w + col / 2;
            let u = u_plane[ci] as f32 - 128.0;
            let v = v_plane[ci] as f32 - 128.0;

            let r = y + 1.402 * v;
            let g = y - 0.344_136 * u - 0.714_136 * v;
            let b = y + 1.772 * u;
            rgb.extend([clamp_u8(r), clamp_u8(g), clamp_u8(b)]);
        }
    }
    rgb
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
