//! Terminal and JSON presentation of a comparison outcome.

use std::fmt;

use facecmp_match::similarity;
use serde::Serialize;

use crate::session::ComparisonOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub images: Vec<ImageCard>,
    pub matrix: Vec<Vec<bool>>,
    pub distances: Vec<Vec<f64>>,
    pub matching_pairs: Vec<PairLine>,
    pub threshold: Option<ThresholdLine>,
    pub matches_found: usize,
    pub total_images: usize,
    /// Matrix row/column headings; empty slots sent to the service show as "(empty)".
    #[serde(skip)]
    pub row_labels: Vec<String>,
}

/// One image as shown to the user. Face numbers are 1-based slot numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageCard {
    pub face: usize,
    pub url: String,
    pub has_match: bool,
    pub best_distance: Option<f64>,
    pub similarity: Option<f64>,
    pub matches: Vec<usize>,
    pub all_distances: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairLine {
    pub first: usize,
    pub second: usize,
    pub distance: f64,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdLine {
    pub distance: f64,
    /// `(1 - threshold) * 100`
    pub similarity_percent: f64,
}

impl Report {
    pub fn new(outcome: &ComparisonOutcome) -> Self {
        let face = |idx: usize| outcome.images[idx].slot + 1;

        let images: Vec<ImageCard> = outcome
            .images
            .iter()
            .zip(&outcome.summaries)
            .filter(|(img, _)| !img.url.is_empty())
            .map(|(img, summary)| ImageCard {
                face: img.slot + 1,
                url: img.url.clone(),
                has_match: summary.has_match,
                best_distance: summary.best_distance,
                similarity: summary.best_similarity(),
                matches: summary.matches.iter().map(|&j| face(j)).collect(),
                all_distances: summary.all_distances.clone(),
            })
            .collect();

        let matching_pairs = outcome
            .matrix
            .pairs()
            .into_iter()
            .map(|(i, j)| {
                let distance = outcome.distances.get(i, j);
                PairLine {
                    first: face(i),
                    second: face(j),
                    distance,
                    similarity: similarity(distance),
                }
            })
            .collect();

        let row_labels = outcome
            .images
            .iter()
            .map(|img| {
                if img.url.is_empty() {
                    "(empty)".to_string()
                } else {
                    format!("Face {}", img.slot + 1)
                }
            })
            .collect();

        Self {
            row_labels,
            matches_found: images.iter().filter(|c| c.has_match).count(),
            total_images: images.len(),
            images,
            matrix: outcome.matrix.to_rows(),
            distances: outcome.distances.to_rows(),
            matching_pairs,
            threshold: outcome.threshold.map(|distance| ThresholdLine {
                distance,
                similarity_percent: similarity(distance) * 100.0,
            }),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Comparison Results")?;
        writeln!(f)?;

        for card in &self.images {
            writeln!(f, "Face {}  {}", card.face, card.url)?;
            if card.has_match {
                writeln!(f, "  ✓ Match Found")?;
            } else {
                writeln!(f, "  ✗ No Match")?;
            }
            if let Some(sim) = card.similarity {
                writeln!(f, "  Similarity: {:.3}", sim)?;
            }
            for (partner, distance) in card.matches.iter().zip(&card.all_distances) {
                writeln!(
                    f,
                    "  matches Face {} (similarity {:.3})",
                    partner,
                    similarity(*distance)
                )?;
            }
        }

        if !self.matrix.is_empty() {
            writeln!(f)?;
            writeln!(f, "Match matrix")?;
            let labels = &self.row_labels;
            write!(f, "{:<9}", "")?;
            for label in labels {
                write!(f, "{:^9}", label)?;
            }
            writeln!(f)?;
            for (i, row) in self.matrix.iter().enumerate() {
                write!(f, "{:<9}", labels.get(i).map(String::as_str).unwrap_or(""))?;
                for (j, &hit) in row.iter().enumerate() {
                    let mark = match (i == j, hit) {
                        (true, _) => "—",
                        (false, true) => "✓",
                        (false, false) => "✗",
                    };
                    write!(f, "{:^9}", mark)?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f)?;
        if self.matching_pairs.is_empty() {
            writeln!(f, "Matching pairs: none")?;
        } else {
            writeln!(f, "Matching pairs")?;
            for pair in &self.matching_pairs {
                writeln!(
                    f,
                    "  Face {} ↔ Face {}  similarity {:.3}",
                    pair.first, pair.second, pair.similarity
                )?;
            }
        }

        if let Some(threshold) = &self.threshold {
            writeln!(
                f,
                "Threshold: distance ≤ {:.3} (similarity ≥ {:.1}%)",
                threshold.distance, threshold.similarity_percent
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Analysis Summary")?;
        writeln!(f, "  Matches Found: {}", self.matches_found)?;
        write!(f, "  Total Images:  {}", self.total_images)
    }
}
