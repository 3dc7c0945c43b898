//! Terminal rendering of a [`ColorGrid`].

use std::io::{self, IsTerminal, Write};

use colored::Colorize;

use crate::grid::ColorGrid;
use crate::sampler::{Outcome, OutcomeCounts};

/// Title line for a heatmap of `counts`.
pub fn heatmap_title(counts: &OutcomeCounts) -> String {
    format!(
        "Quantum Heatmap (N={} vs Ab={})",
        counts.normal(),
        counts.abnormal()
    )
}

/// Draws a grid as rows of two-character cells.
///
/// With color on, normal cells are cyan and abnormal cells red. With color
/// off the two outcomes get distinct glyphs instead.
#[derive(Debug, Clone, Copy)]
pub struct TerminalRenderer {
    color: bool,
}

impl TerminalRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Color only when stdout is a terminal and `colored` allows it.
    pub fn for_stdout() -> Self {
        Self::new(
            io::stdout().is_terminal() && colored::control::SHOULD_COLORIZE.should_colorize(),
        )
    }

    fn cell(&self, outcome: Outcome) -> String {
        match (self.color, outcome) {
            (true, Outcome::Normal) => "██".cyan().to_string(),
            (true, Outcome::Abnormal) => "██".red().to_string(),
            (false, Outcome::Normal) => "..".to_string(),
            (false, Outcome::Abnormal) => "##".to_string(),
        }
    }

    pub fn render<W: Write>(
        &self,
        grid: &ColorGrid,
        counts: &OutcomeCounts,
        out: &mut W,
    ) -> io::Result<()> {
        let title = heatmap_title(counts);
        if self.color {
            writeln!(out, "{}", title.bold())?;
        } else {
            writeln!(out, "{title}")?;
        }
        for row in grid.rows() {
            let line: String = row.iter().map(|c| self.cell(*c)).collect();
            writeln!(out, "{line}")?;
        }
        writeln!(
            out,
            "{} normal ({} cells)  {} abnormal ({} cells)",
            self.cell(Outcome::Normal),
            grid.count(Outcome::Normal),
            self.cell(Outcome::Abnormal),
            grid.count(Outcome::Abnormal),
        )
    }

    /// Render into a `String`.
    pub fn render_to_string(
        &self,
        grid: &ColorGrid,
        counts: &OutcomeCounts,
    ) -> io::Result<String> {
        let mut buf = Vec::new();
        self.render(grid, counts, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::map_counts_to_grid;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn title_reports_both_counts() {
        assert_eq!(
            heatmap_title(&OutcomeCounts::new(512, 488)),
            "Quantum Heatmap (N=512 vs Ab=488)"
        );
    }

    #[test]
    fn plain_render_has_one_line_per_row() {
        let counts = OutcomeCounts::new(3, 1);
        let grid = map_counts_to_grid(&counts, 4, &mut StdRng::seed_from_u64(2)).unwrap();
        let text = TerminalRenderer::new(false).render_to_string(&grid, &counts).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 4 + 1);
        assert_eq!(lines[0], "Quantum Heatmap (N=3 vs Ab=1)");
        for row in &lines[1..5] {
            assert_eq!(row.len(), 8);
            assert!(!row.contains('\u{1b}'));
        }
        let body: String = lines[1..5].concat();
        assert_eq!(body.matches("..").count(), 12);
        assert_eq!(body.matches("##").count(), 4);
        assert!(lines[5].contains("12 cells") && lines[5].contains("4 cells"));
    }

    #[test]
    fn colored_render_to_string_is_valid_utf8() {
        let counts = OutcomeCounts::new(1, 1);
        let grid = map_counts_to_grid(&counts, 2, &mut StdRng::seed_from_u64(4)).unwrap();
        let text = TerminalRenderer::new(true).render_to_string(&grid, &counts).unwrap();
        assert_eq!(text.matches("██").count(), 4 + 2);
    }
}
