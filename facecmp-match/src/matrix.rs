use ndarray::Array2;

/// Errors raised when the service hands back matrices we refuse to interpret.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("{what} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("distance at [{row}][{col}] is {value}, expected a finite non-negative number")]
    InvalidValue { row: usize, col: usize, value: f64 },
}

/// Pairwise "image i matches image j" flags as reported by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMatrix {
    cells: Array2<bool>,
}

/// Pairwise face distances; lower is more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    cells: Array2<f64>,
}

impl ComparisonMatrix {
    pub fn new(cells: Array2<bool>) -> Result<Self, MatchError> {
        ensure_square("matrix", cells.dim())?;
        Ok(Self { cells })
    }

    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, MatchError> {
        Ok(Self {
            cells: square_from_rows("matrix", rows)?,
        })
    }

    /// Number of images (N).
    pub fn len(&self) -> usize {
        self.cells.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[[row, col]]
    }

    /// Every unordered pair `(i, j)` with `i < j` flagged as a match, row-major.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let n = self.len();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.cells[[i, j]])
            .collect()
    }

    /// Off-diagonal cells `(i, j)`, `i < j`, whose mirror disagrees.
    pub fn asymmetric_cells(&self) -> Vec<(usize, usize)> {
        let n = self.len();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.cells[[i, j]] != self.cells[[j, i]])
            .collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        self.cells.rows().into_iter().map(|r| r.to_vec()).collect()
    }
}

impl DistanceMatrix {
    pub fn new(cells: Array2<f64>) -> Result<Self, MatchError> {
        ensure_square("distances", cells.dim())?;
        Ok(Self { cells })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatchError> {
        Ok(Self {
            cells: square_from_rows("distances", rows)?,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[[row, col]]
    }

    /// Fails on the first off-diagonal cell that is negative, NaN or infinite.
    /// The diagonal is never read.
    pub fn validate(&self) -> Result<(), MatchError> {
        for ((row, col), &value) in self.cells.indexed_iter() {
            if row != col && !(value.is_finite() && value >= 0.0) {
                return Err(MatchError::InvalidValue { row, col, value });
            }
        }
        Ok(())
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.cells.rows().into_iter().map(|r| r.to_vec()).collect()
    }
}

fn ensure_square(what: &'static str, dim: (usize, usize)) -> Result<(), MatchError> {
    if dim.0 != dim.1 {
        return Err(MatchError::ShapeMismatch {
            what,
            expected: (dim.0, dim.0),
            found: dim,
        });
    }
    Ok(())
}

fn square_from_rows<T: Clone>(
    what: &'static str,
    rows: Vec<Vec<T>>,
) -> Result<Array2<T>, MatchError> {
    let n = rows.len();
    if let Some(bad) = rows.iter().find(|row| row.len() != n) {
        return Err(MatchError::ShapeMismatch {
            what,
            expected: (n, n),
            found: (n, bad.len()),
        });
    }
    let flat: Vec<T> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, n), flat).map_err(|_| MatchError::ShapeMismatch {
        what,
        expected: (n, n),
        found: (n, 0),
    })
}
