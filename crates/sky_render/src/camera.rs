use glam::Mat4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Pixel rectangle inside the window where the board is drawn.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoardViewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Maps the fixed-size board onto the window, preserving its aspect ratio and
/// centring it with bars on the long axis.
///
/// Board coordinates have their origin at the top-left corner and `y` growing
/// downward, matching the game's view space.
pub struct Camera2D {
    pub board: (f32, f32),
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(board_width: f32, board_height: f32, viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            board: (board_width, board_height),
            viewport: (viewport_width, viewport_height),
        }
    }

    /// Window pixels per board pixel.
    pub fn scale(&self) -> f32 {
        let (bw, bh) = self.board;
        if bw <= 0.0 || bh <= 0.0 {
            return 1.0;
        }
        let sx = self.viewport.0 as f32 / bw;
        let sy = self.viewport.1 as f32 / bh;
        sx.min(sy)
    }

    pub fn board_viewport(&self) -> BoardViewport {
        let scale = self.scale();
        let width = self.board.0 * scale;
        let height = self.board.1 * scale;
        BoardViewport {
            x: ((self.viewport.0 as f32 - width) * 0.5).max(0.0),
            y: ((self.viewport.1 as f32 - height) * 0.5).max(0.0),
            width,
            height,
        }
    }

    /// Window position (physical pixels) to board coordinates. `None` when the
    /// point lies in the letterbox bars.
    pub fn screen_to_board(&self, screen_x: f64, screen_y: f64) -> Option<(f32, f32)> {
        let vp = self.board_viewport();
        let scale = self.scale();
        let bx = (screen_x as f32 - vp.x) / scale;
        let by = (screen_y as f32 - vp.y) / scale;
        let inside = (0.0..=self.board.0).contains(&bx) && (0.0..=self.board.1).contains(&by);
        inside.then_some((bx, by))
    }

    /// Orthographic projection of the board rectangle. Used together with a
    /// render-pass viewport set to `board_viewport()`.
    pub fn build_uniform(&self) -> CameraUniform {
        let proj = Mat4::orthographic_rh(0.0, self.board.0, self.board.1, 0.0, -1.0, 1.0);
        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn exact_fit_has_no_bars() {
        let cam = Camera2D::new(360.0, 576.0, 720, 1152);
        assert_eq!(cam.scale(), 2.0);
        let vp = cam.board_viewport();
        assert_eq!((vp.x, vp.y, vp.width, vp.height), (0.0, 0.0, 720.0, 1152.0));
    }

    #[test]
    fn wide_window_is_pillarboxed() {
        let cam = Camera2D::new(360.0, 576.0, 1000, 576);
        let vp = cam.board_viewport();
        assert_eq!(vp.x, 320.0);
        assert_eq!(vp.y, 0.0);
        assert_eq!(cam.screen_to_board(330.0, 5.0), Some((10.0, 5.0)));
        assert_eq!(cam.screen_to_board(100.0, 5.0), None);
    }

    #[test]
    fn tall_window_is_letterboxed() {
        let cam = Camera2D::new(360.0, 576.0, 360, 776);
        let vp = cam.board_viewport();
        assert_eq!(vp.y, 100.0);
        assert_eq!(cam.screen_to_board(180.0, 50.0), None);
        assert_eq!(cam.screen_to_board(180.0, 100.0), Some((180.0, 0.0)));
    }

    #[test]
    fn projection_puts_origin_top_left() {
        let cam = Camera2D::new(360.0, 576.0, 360, 576);
        let m = Mat4::from_cols_array_2d(&cam.build_uniform().view_proj);
        let top_left = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let bottom_right = m * Vec4::new(360.0, 576.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-6 && (top_left.y - 1.0).abs() < 1e-6);
        assert!((bottom_right.x - 1.0).abs() < 1e-6 && (bottom_right.y + 1.0).abs() < 1e-6);
    }
}
