//! Clickable UI building blocks.
//!
//! Rendering and click-target registration live together so a row can never
//! be drawn in one place and hit-tested in another.

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::text::Line;

use crate::input::ClickState;

/// A builder that pairs rendered [`Line`]s with click actions.
///
/// Annotate lines as clickable while adding them, then call
/// [`register_targets`](ClickableList::register_targets) once to place all
/// targets at the rows the lines actually land on.
///
/// ```ignore
/// let mut cl = ClickableList::new();
/// cl.push(Line::from("背包物品"));
/// cl.push_clickable(Line::from(" [1] 图书馆"), LOCATION_BASE);
/// cl.register_targets(area, &mut cs, 1, 1, 0, inner_width);
/// f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
/// ```
pub struct ClickableList<'a> {
    lines: Vec<Line<'a>>,
    /// `(line_index, action_id)` pairs.
    actions: Vec<(u16, u16)>,
}

impl<'a> ClickableList<'a> {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn push(&mut self, line: Line<'a>) {
        self.lines.push(line);
    }

    /// The action follows this line wherever it ends up.
    pub fn push_clickable(&mut self, line: Line<'a>, action_id: u16) {
        let idx = self.lines.len() as u16;
        self.actions.push((idx, action_id));
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Rows the lines occupy once wrapped at `inner_width` (0 = no wrapping).
    pub fn visual_height(&self, inner_width: u16) -> u16 {
        if inner_width == 0 {
            return self.lines.len() as u16;
        }
        self.lines
            .iter()
            .map(|line| wrapped_rows(line.width(), inner_width as usize))
            .sum()
    }

    pub fn into_lines(self) -> Vec<Line<'a>> {
        self.lines
    }

    /// Register click targets for all clickable lines.
    ///
    /// * `top_offset` / `bottom_offset`: rows taken by borders.
    /// * `scroll`: vertical scroll in visual rows.
    /// * `inner_width`: wrap width; `0` means one logical line per row.
    pub fn register_targets(
        &self,
        area: Rect,
        cs: &mut ClickState,
        top_offset: u16,
        bottom_offset: u16,
        scroll: u16,
        inner_width: u16,
    ) {
        let content_y = area.y + top_offset;
        let content_end = area.y + area.height.saturating_sub(bottom_offset);

        let mut visual_starts: Vec<u16> = Vec::with_capacity(self.lines.len());
        let mut visual_heights: Vec<u16> = Vec::with_capacity(self.lines.len());
        let mut cumulative: u16 = 0;
        for line in &self.lines {
            visual_starts.push(cumulative);
            let h = if inner_width == 0 {
                1
            } else {
                wrapped_rows(line.width(), inner_width as usize)
            };
            visual_heights.push(h);
            cumulative += h;
        }

        for &(line_idx, action_id) in &self.actions {
            let li = line_idx as usize;
            if li >= self.lines.len() {
                continue;
            }
            for r in 0..visual_heights[li] {
                let vr = visual_starts[li] + r;
                if vr < scroll {
                    continue;
                }
                let screen_row = content_y + (vr - scroll);
                if screen_row >= content_end {
                    break;
                }
                cs.add_row_target(area, screen_row, action_id);
            }
        }
    }
}

fn wrapped_rows(line_width: usize, inner_width: usize) -> u16 {
    if line_width <= inner_width {
        1
    } else {
        line_width.div_ceil(inner_width) as u16
    }
}
