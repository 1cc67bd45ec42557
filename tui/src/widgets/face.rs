//! Face Widget
//!
//! Paints an expression frame into a terminal buffer using upper half
//! blocks: each cell carries two vertical pixels, the top one as the
//! foreground color and the bottom one as the background. The frame is
//! scaled to the area with nearest-neighbour sampling.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

use expression_core::Frame;

/// Upper half block
const HALF_BLOCK: &str = "\u{2580}";

/// Renders one [`Frame`] into an area
pub struct FaceWidget<'a> {
    frame: &'a Frame,
}

impl<'a> FaceWidget<'a> {
    /// Widget over a frame
    pub fn new(frame: &'a Frame) -> Self {
        Self { frame }
    }

    fn sample(&self, area: Rect, col: u16, sub_row: u32) -> Color {
        let fw = self.frame.width();
        let fh = self.frame.height();
        let x = u32::from(col) * fw / u32::from(area.width.max(1));
        let y = sub_row * fh / (u32::from(area.height.max(1)) * 2);
        let px = self
            .frame
            .get(x.min(fw.saturating_sub(1)), y.min(fh.saturating_sub(1)))
            .unwrap_or_default();
        Color::Rgb(px.r, px.g, px.b)
    }
}

impl Widget for FaceWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.frame.width() == 0 || self.frame.height() == 0 {
            return;
        }
        for row in 0..area.height {
            for col in 0..area.width {
                let top = self.sample(area, col, u32::from(row) * 2);
                let bottom = self.sample(area, col, u32::from(row) * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(HALF_BLOCK).set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}

/// Map a terminal cell inside `area` to the frame pixel under its center
///
/// Cells outside the area are clamped to its edge.
pub fn cell_to_pixel(area: Rect, col: u16, row: u16, frame_size: (u32, u32)) -> (f32, f32) {
    let width = f32::from(area.width.max(1));
    let height = f32::from(area.height.max(1));
    let col = f32::from(col.clamp(area.x, area.x + area.width.saturating_sub(1)) - area.x);
    let row = f32::from(row.clamp(area.y, area.y + area.height.saturating_sub(1)) - area.y);
    (
        (col + 0.5) * frame_size.0 as f32 / width,
        (row + 0.5) * frame_size.1 as f32 / height,
    )
}
