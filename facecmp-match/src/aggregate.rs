use serde::{Deserialize, Serialize};

use crate::matrix::{ComparisonMatrix, DistanceMatrix, MatchError};

/// Derived match information for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub has_match: bool,
    /// Partner indices in ascending order; never contains the image's own index.
    pub matches: Vec<usize>,
    pub best_distance: Option<f64>,
    /// Distances aligned with `matches`.
    pub all_distances: Vec<f64>,
}

impl MatchSummary {
    /// `1 - best_distance`, the value shown to users.
    pub fn best_similarity(&self) -> Option<f64> {
        self.best_distance.map(similarity)
    }

    /// `(partner, distance)` pairs in partner order.
    pub fn partners(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.matches
            .iter()
            .copied()
            .zip(self.all_distances.iter().copied())
    }
}

pub fn similarity(distance: f64) -> f64 {
    1.0 - distance
}

/// Receives structured events while summaries are derived.
pub trait AggregateObserver {
    fn on_start(&self, _images: usize) {}
    fn on_asymmetry(&self, _row: usize, _col: usize) {}
    fn on_summary(&self, _index: usize, _summary: &MatchSummary) {}
}

pub struct NoopObserver;

impl AggregateObserver for NoopObserver {}

/// Forwards aggregation events to the `log` facade.
pub struct LogObserver;

impl AggregateObserver for LogObserver {
    fn on_start(&self, images: usize) {
        log::debug!("aggregating matches for {} image(s)", images);
    }

    fn on_asymmetry(&self, row: usize, col: usize) {
        log::warn!(
            "service matrix is asymmetric at [{}][{}]; using row values as reported",
            row,
            col
        );
    }

    fn on_summary(&self, index: usize, summary: &MatchSummary) {
        log::debug!(
            "image {}: has_match={} matches={:?} best_distance={:?}",
            index,
            summary.has_match,
            summary.matches,
            summary.best_distance
        );
    }
}

pub fn aggregate(
    matrix: &ComparisonMatrix,
    distances: &DistanceMatrix,
) -> Result<Vec<MatchSummary>, MatchError> {
    aggregate_with(matrix, distances, &NoopObserver)
}

/// Derive one [`MatchSummary`] per image from the service's matrices.
///
/// `matrix` is the sole source of truth for whether two images match;
/// `distances` only supplies magnitudes. Malformed input is rejected rather
/// than partially summarised.
pub fn aggregate_with(
    matrix: &ComparisonMatrix,
    distances: &DistanceMatrix,
    observer: &dyn AggregateObserver,
) -> Result<Vec<MatchSummary>, MatchError> {
    let n = matrix.len();
    if distances.len() != n {
        return Err(MatchError::ShapeMismatch {
            what: "distances",
            expected: (n, n),
            found: (distances.len(), distances.len()),
        });
    }
    distances.validate()?;

    observer.on_start(n);
    for (row, col) in matrix.asymmetric_cells() {
        observer.on_asymmetry(row, col);
    }

    let summaries = (0..n)
        .map(|i| {
            let (matches, all_distances): (Vec<usize>, Vec<f64>) = (0..n)
                .filter(|&j| j != i && matrix.get(i, j))
                .map(|j| (j, distances.get(i, j)))
                .unzip();
            let best_distance = all_distances.iter().copied().reduce(f64::min);
            let summary = MatchSummary {
                has_match: !matches.is_empty(),
                matches,
                best_distance,
                all_distances,
            };
            observer.on_summary(i, &summary);
            summary
        })
        .collect();

    Ok(summaries)
}
