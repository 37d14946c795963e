//! Terminal heatmap renderer
//!
//! Draws the interpolated grid as a character ramp, with the sensor labels
//! placed at the corners they belong to. The colour range is only moved when
//! the render tick reports a change, mirroring how a plotting backend keeps
//! its colour limits.

use heatmap_decoder::{
    format_temperature, DisplayRange, Grid, RenderFrame, RenderSink, SensorLabel,
};
use std::io::Write;
use std::time::Instant;

/// Characters from coldest to hottest
const RAMP: &[u8] = b" .:-=+*#%@";

/// ANSI clear screen + cursor home
const CLEAR: &str = "\x1b[2J\x1b[H";

pub struct TerminalRenderer<W: Write> {
    out: W,
    title: String,
    width: usize,
    clear_screen: bool,
    deadline: Option<Instant>,
    clim: Option<DisplayRange>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, title: impl Into<String>, width: usize) -> Self {
        Self {
            out,
            title: title.into(),
            width: width.max(2),
            clear_screen: true,
            deadline: None,
            clim: None,
        }
    }

    /// Close the display at `deadline`
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Disable ANSI screen clearing (for logs and tests)
    pub fn without_clear(mut self) -> Self {
        self.clear_screen = false;
        self
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn label_text(label: &SensorLabel) -> String {
        let mut text = format!("{}: {}", label.label, format_temperature(label.value));
        if label.stale {
            text.push_str(" (stale)");
        }
        text
    }

    /// Left and right label on one line, padded to the map width
    fn label_line(&self, left: &SensorLabel, right: &SensorLabel) -> String {
        let left = Self::label_text(left);
        let right = Self::label_text(right);
        let used = left.chars().count() + right.chars().count();
        let gap = self.width.saturating_sub(used).max(1);
        format!("{}{}{}", left, " ".repeat(gap), right)
    }

    /// Downsample the grid to `width` columns and half as many rows, top row first
    fn draw_rows(&self, grid: &Grid, clim: &DisplayRange) -> Vec<String> {
        let (n_rows, n_cols) = grid.dim();
        let cols = self.width.min(n_cols).max(1);
        let rows = (cols / 2).max(1);

        let pick = |i: usize, count: usize, n: usize| -> usize {
            if count <= 1 {
                0
            } else {
                i * (n - 1) / (count - 1)
            }
        };

        (0..rows)
            .map(|r| {
                // Grid row 0 is the bottom edge
                let row = pick(rows - 1 - r, rows, n_rows);
                (0..cols)
                    .map(|c| {
                        let value = grid[[row, pick(c, cols, n_cols)]];
                        let level = clim.normalize(value) * (RAMP.len() - 1) as f64;
                        RAMP[level.round() as usize] as char
                    })
                    .collect()
            })
            .collect()
    }
}

impl<W: Write> RenderSink for TerminalRenderer<W> {
    fn render(&mut self, frame: &RenderFrame) -> heatmap_decoder::Result<()> {
        if let Some(update) = frame.range {
            if update.changed || self.clim.is_none() {
                self.clim = Some(update.range);
            }
        }

        let [s0, s1, s2, s3] = &frame.labels;
        let mut text = String::new();
        if self.clear_screen {
            text.push_str(CLEAR);
        }
        text.push_str(&self.title);
        text.push('\n');
        text.push_str(&self.label_line(s1, s2));
        text.push('\n');

        match (&frame.grid, &self.clim) {
            (Some(grid), Some(clim)) => {
                for row in self.draw_rows(grid, clim) {
                    text.push_str(&row);
                    text.push('\n');
                }
                text.push_str(&self.label_line(s0, s3));
                text.push('\n');
                text.push_str(&format!("Range: {:.1} .. {:.1} °C\n", clim.vmin, clim.vmax));
            }
            _ => {
                text.push_str("Waiting for all four sensors...\n");
                text.push_str(&self.label_line(s0, s3));
                text.push('\n');
            }
        }

        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() < deadline,
            None => true,
        }
    }
}
