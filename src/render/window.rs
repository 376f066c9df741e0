use anyhow::Result;
use minifb::{Key, Window, WindowOptions};

use crate::render::canvas::FrameBuffer;

/// minifb で FrameBuffer を表示するウィンドウ
pub struct OverlayWindow {
    window: Window,
    surface: FrameBuffer,
    width: usize,
    height: usize,
}

impl OverlayWindow {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;
        window.set_target_fps(60);

        Ok(Self {
            window,
            surface: FrameBuffer::new(width, height),
            width,
            height,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    pub fn surface(&mut self) -> &mut FrameBuffer {
        &mut self.surface
    }

    /// 再描画要求があればバッファを転送し、なければイベント処理だけ行う
    pub fn update(&mut self) -> Result<()> {
        if self.surface.take_redraw_request() {
            self.window
                .update_with_buffer(self.surface.pixels(), self.width, self.height)?;
        } else {
            self.window.update();
        }
        Ok(())
    }
}
