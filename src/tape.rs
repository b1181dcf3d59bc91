//! This module defines the `Tape`, the engine's read/write storage. The tape is conceptually
//! infinite in both directions; it is materialized as a `Vec<char>` that grows on demand at
//! either end.

use std::fmt;

/// A growable tape of symbols.
///
/// Growing to the left shifts every materialized index by one. `origin` counts how many
/// cells were prepended since the tape was created, so `index - origin` is the stable
/// logical offset of a cell relative to the first input symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<char>,
    blank: char,
    origin: usize,
}

impl Tape {
    /// Creates a tape holding `input` followed by `padding` blank cells.
    pub fn new(input: &str, blank: char, padding: usize) -> Self {
        let mut cells: Vec<char> = input.chars().collect();
        cells.resize(cells.len() + padding, blank);

        Self {
            cells,
            blank,
            origin: 0,
        }
    }

    /// Makes sure `head` addresses a materialized cell and returns its non-negative index.
    ///
    /// A head past the right end appends blanks; a negative head prepends blanks and the
    /// returned index is re-based to 0. During execution the head moves by at most one cell
    /// per step, so at most one cell is added per call.
    pub fn materialize(&mut self, head: isize) -> usize {
        if head < 0 {
            let missing = head.unsigned_abs();
            self.cells
                .splice(0..0, std::iter::repeat(self.blank).take(missing));
            self.origin += missing;
            log::trace!("tape extended {missing} cell(s) to the left");
            return 0;
        }

        let index = head as usize;
        if index >= self.cells.len() {
            let missing = index + 1 - self.cells.len();
            self.cells.resize(index + 1, self.blank);
            log::trace!("tape extended {missing} cell(s) to the right");
        }

        index
    }

    /// Returns the symbol at `index`, or the blank symbol outside the materialized cells.
    pub fn read(&self, index: usize) -> char {
        self.cells.get(index).copied().unwrap_or(self.blank)
    }

    /// Writes `symbol` at `index`, growing the tape to the right if needed.
    pub fn write(&mut self, index: usize, symbol: char) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, self.blank);
        }
        self.cells[index] = symbol;
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn blank(&self) -> char {
        self.blank
    }

    /// Number of cells prepended since the tape was created.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Converts a materialized index into its logical offset from the first input cell.
    pub fn logical(&self, index: isize) -> isize {
        index - self.origin as isize
    }

    /// Returns the tape content with blank runs stripped from both ends.
    ///
    /// This is a display helper; the materialized cells are untouched.
    pub fn trimmed(&self) -> String {
        let blank = self.blank;
        let start = self.cells.iter().position(|&c| c != blank);
        let end = self.cells.iter().rposition(|&c| c != blank);

        match (start, end) {
            (Some(start), Some(end)) => self.cells[start..=end].iter().collect(),
            _ => String::new(),
        }
    }

    /// Returns the `2 * radius + 1` symbols centred on `center`, using the blank symbol for
    /// positions outside the materialized cells.
    ///
    /// |   | a | b | c |   |   window(1, 2)
    ///  -1   0   1   2   3   index
    pub fn window(&self, center: isize, radius: usize) -> Vec<char> {
        let radius = radius as isize;
        (center - radius..=center + radius)
            .map(|i| {
                if i < 0 {
                    self.blank
                } else {
                    self.read(i as usize)
                }
            })
            .collect()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cells.iter().try_for_each(|c| write!(f, "{c}"))
    }
}
