//! Placement of symbols relative to previously placed ones.
//!
//! Symbols are either placed at the start of a new line, relative to the
//! first symbol of the previous line, or on the current line, relative to the
//! symbol placed before them. Same-line placement is anchored to a baseline
//! that is smoothed by taking the median of the last three bottoms.

/// The running cursors of the layout model.
///
/// Coordinates grow to the right and downwards. `i64` leaves plenty of room
/// for adversarial streams that keep moving in one direction.
#[derive(Debug, Clone, Default)]
pub(crate) struct Layout {
    /// Left edge of the first symbol on the current line.
    line_left: i64,
    /// Bottom edge of the first symbol on the current line.
    line_bottom: i64,
    /// Right edge of the previously placed symbol.
    previous_right: i64,
    /// Smoothed bottom edge used for the next same-line symbol.
    previous_bottom: i64,
    baselines: [i64; 3],
    baseline_index: usize,
}

impl Layout {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Place a `width` x `height` symbol and return its top-left corner.
    ///
    /// `dx` and `dy` are the decoded offsets, with `dy` pointing downwards.
    pub(crate) fn place(
        &mut self,
        new_line: bool,
        dx: i32,
        dy: i32,
        width: u32,
        height: u32,
    ) -> (i64, i64) {
        let (width, height) = (i64::from(width), i64::from(height));
        let (dx, dy) = (i64::from(dx), i64::from(dy));

        if new_line {
            let left = self.line_left + dx;
            let top = self.line_bottom + dy;
            let bottom = top + height - 1;

            self.line_left = left;
            self.line_bottom = bottom;
            self.previous_right = left + width - 1;
            self.previous_bottom = bottom;
            self.reset_baseline(bottom);

            (left, top)
        } else {
            let left = self.previous_right + dx;
            let bottom = self.previous_bottom + dy;

            self.previous_right = left + width - 1;
            self.previous_bottom = self.update_baseline(bottom);

            (left, bottom - height + 1)
        }
    }

    fn reset_baseline(&mut self, bottom: i64) {
        self.baselines = [bottom; 3];
        self.baseline_index = 0;
    }

    /// Record a new bottom and return the median of the last three.
    fn update_baseline(&mut self, bottom: i64) -> i64 {
        self.baseline_index = (self.baseline_index + 1) % 3;
        self.baselines[self.baseline_index] = bottom;

        let mut sorted = self.baselines;
        sorted.sort_unstable();
        sorted[1]
    }
}
