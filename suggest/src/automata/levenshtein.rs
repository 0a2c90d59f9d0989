use smallvec::{smallvec, SmallVec};
use termtrie::{Runes, Step, StepFilter};

type Cells = SmallVec<[u32; 16]>;

#[derive(Debug, Clone)]
struct Row {
    /// `cells[i]`: edit distance between the first `i` query code points and
    /// the current path. Empty once a prefix-mode match can no longer improve.
    cells: Cells,
    /// Prefix mode: smallest distance at which the whole query matched a
    /// prefix of the path so far.
    best: Option<u32>,
}

/// Accepts paths within a bounded Levenshtein distance of a query.
///
/// Implemented as a stack of dynamic-programming rows, one per code point
/// fed. In prefix mode a path is accepted as soon as some prefix of it is
/// within distance of the whole query, and every extension stays accepted.
#[derive(Debug, Clone)]
pub struct LevenshteinFilter {
    query: Runes,
    max_distance: u32,
    prefix_mode: bool,
    rows: Vec<Row>,
}

impl LevenshteinFilter {
    pub fn new(query: &str, max_distance: u32, prefix_mode: bool) -> Self {
        Self::from_runes(query.chars().collect(), max_distance, prefix_mode)
    }

    pub fn from_runes(query: Runes, max_distance: u32, prefix_mode: bool) -> Self {
        let cells: Cells = (0..=query.len() as u32).collect();
        let last = query.len() as u32;
        let best = (prefix_mode && last <= max_distance).then_some(last);
        Self {
            query,
            max_distance,
            prefix_mode,
            rows: vec![Row { cells, best }],
        }
    }

    /// Distance of the current path to the query: the best prefix match in
    /// prefix mode, the full edit distance otherwise.
    pub fn distance(&self) -> u32 {
        let row = self.top();
        match row.best {
            Some(best) if self.prefix_mode => best,
            _ => row.cells.last().copied().unwrap_or(u32::MAX),
        }
    }

    #[inline]
    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    #[inline]
    fn top(&self) -> &Row {
        // The initial row is never popped.
        &self.rows[self.rows.len() - 1]
    }

    fn next_row(&self, prev: &Cells, c: char) -> Cells {
        let mut row: Cells = smallvec![prev[0] + 1];
        for (i, &q) in self.query.iter().enumerate() {
            let substitute = prev[i] + u32::from(q != c);
            let delete = prev[i + 1] + 1;
            let insert = row[i] + 1;
            row.push(substitute.min(delete).min(insert));
        }
        row
    }
}

impl StepFilter for LevenshteinFilter {
    fn step(&mut self, c: char) -> Step {
        let top = self.top();
        if top.cells.is_empty() {
            // Frozen prefix-mode match.
            let frozen = top.clone();
            self.rows.push(frozen);
            return Step::Continue { matched: true };
        }

        let cells = self.next_row(&top.cells, c);
        let prev_best = top.best;
        let last = cells[cells.len() - 1];
        let row_min = cells.iter().copied().min().unwrap_or(u32::MAX);

        if !self.prefix_mode {
            if row_min > self.max_distance {
                return Step::Stop;
            }
            let matched = last <= self.max_distance;
            self.rows.push(Row { cells, best: None });
            return Step::Continue { matched };
        }

        let best = match prev_best {
            Some(b) if last <= self.max_distance => Some(b.min(last)),
            None if last <= self.max_distance => Some(last),
            other => other,
        };
        if row_min > self.max_distance {
            return match best {
                Some(best) => {
                    self.rows.push(Row {
                        cells: Cells::new(),
                        best: Some(best),
                    });
                    Step::Continue { matched: true }
                }
                None => Step::Stop,
            };
        }
        self.rows.push(Row { cells, best });
        Step::Continue {
            matched: best.is_some(),
        }
    }

    fn pop(&mut self, consumed: usize) {
        let keep = self.rows.len().saturating_sub(consumed).max(1);
        self.rows.truncate(keep);
    }
}
