//! Stage text parsing.

use crate::grid::TileGrid;

/// Marker that starts a line splitting the overworld from the underground.
const UNDERGROUND_MARKER: char = '*';

/// Parsed stage text: grid rows plus the row at which the underground begins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stage {
    lines: Vec<String>,
    underground_row: u32,
}

impl Stage {
    /// Parses stage text, one grid row per line.
    ///
    /// Blank lines are skipped. A line starting with `*` marks the number of rows
    /// read so far as the first underground row; without one the whole stage
    /// belongs to the overworld.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut lines = Vec::new();
        let mut underground_row = None;
        for line in source.lines() {
            if line.is_empty() {
                continue;
            }
            if line.starts_with(UNDERGROUND_MARKER) {
                underground_row = Some(lines.len());
                continue;
            }
            lines.push(line.to_owned());
        }

        let underground_row = underground_row.unwrap_or(lines.len());
        Self {
            underground_row: u32::try_from(underground_row).unwrap_or(u32::MAX),
            lines,
        }
    }

    /// Raw text of every grid row.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// First underground row.
    #[must_use]
    pub const fn underground_row(&self) -> u32 {
        self.underground_row
    }

    /// Raw character at the provided row and column, if present.
    #[must_use]
    pub fn raw_char(&self, row: u32, column: u32) -> Option<char> {
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        self.lines.get(row)?.chars().nth(column)
    }

    /// Builds the tile grid described by the stage.
    #[must_use]
    pub fn grid(&self) -> TileGrid {
        TileGrid::from_rows(self.lines.iter().map(String::as_str), self.underground_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped_and_marker_sets_split() {
        let stage = Stage::parse("000\n\n111\n*\r\n222\n111\n");
        assert_eq!(stage.lines().len(), 4);
        assert_eq!(stage.underground_row(), 2);
        assert_eq!(stage.raw_char(2, 0), Some('2'));
    }

    #[test]
    fn missing_marker_keeps_everything_overworld() {
        let stage = Stage::parse("0\n1\n");
        assert_eq!(stage.underground_row(), 2);
    }

    #[test]
    fn raw_char_outside_the_text_is_none() {
        let stage = Stage::parse("W!\nIO\n");
        assert_eq!(stage.raw_char(0, 1), Some('!'));
        assert_eq!(stage.raw_char(0, 2), None);
        assert_eq!(stage.raw_char(5, 0), None);
    }
}
