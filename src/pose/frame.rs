use std::fmt;

/// フレーム解放時に呼ばれるコールバック
pub type ReleaseFn = Box<dyn FnOnce() + Send + 'static>;

/// フレームの画素フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb8,
    /// OpenCV のキャプチャ形式
    Bgr8,
    Rgba8,
    Gray8,
    /// YUV 4:2:0 プレーナ (Y, U, V の順)
    I420,
    /// JPEG / PNG などのエンコード済みバイト列
    Encoded,
}

impl PixelFormat {
    /// width x height のフレームに必要なバイト数
    ///
    /// エンコード済みの場合と、サイズが `usize` に収まらない場合は `None`。
    pub fn frame_len(self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width as usize, height as usize);
        let pixels = w.checked_mul(h)?;
        match self {
            Self::Rgb8 | Self::Bgr8 => pixels.checked_mul(3),
            Self::Rgba8 => pixels.checked_mul(4),
            Self::Gray8 => Some(pixels),
            Self::I420 => w
                .div_ceil(2)
                .checked_mul(h.div_ceil(2))?
                .checked_mul(2)?
                .checked_add(pixels),
            Self::Encoded => None,
        }
    }
}

/// 外部から渡される1フレーム
///
/// 解放コールバックはフレームが破棄されるときにちょうど1回呼ばれる。
/// 処理済み・失敗・ドロップのいずれでも同じ。
pub struct RawFrame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
    release: Option<ReleaseFn>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
            release: None,
        }
    }

    /// エンコード済み画像（サイズはデコード時に決まる）
    pub fn encoded(data: Vec<u8>) -> Self {
        Self::new(0, 0, PixelFormat::Encoded, data)
    }

    /// 解放コールバックを設定
    pub fn with_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.release = Some(Box::new(release));
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for RawFrame {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .field("release", &self.release.is_some())
            .finish()
    }
}
