use facecmp_match::{
    aggregate_with, ComparisonMatrix, DistanceMatrix, LogObserver, MatchError, MatchSummary,
};
use log::{info, warn};

use crate::client::ServiceResponse;
use crate::error::CompareError;
use crate::slots::ImageSlots;

/// Anything that can run one comparison request.
pub trait Comparator {
    fn compare(&self, urls: &[String]) -> Result<ServiceResponse, CompareError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
}

/// Which slot a matrix row refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparedImage {
    pub slot: usize,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    /// Indexed like the matrices.
    pub images: Vec<ComparedImage>,
    pub matrix: ComparisonMatrix,
    pub distances: DistanceMatrix,
    pub threshold: Option<f64>,
    pub summaries: Vec<MatchSummary>,
}

impl ComparisonOutcome {
    pub fn matched_images(&self) -> usize {
        self.summaries.iter().filter(|s| s.has_match).count()
    }
}

/// A request that has been started but not yet settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingComparison {
    images: Vec<ComparedImage>,
    all_identical: bool,
}

impl PendingComparison {
    /// The `urls` payload to send, in matrix order.
    pub fn urls(&self) -> Vec<String> {
        self.images.iter().map(|img| img.url.clone()).collect()
    }
}

/// Slot inputs plus the result state of the most recent comparison.
///
/// Only one comparison may be pending at a time. Starting a new one discards
/// the previous outcome and error; a failed one leaves no outcome behind.
pub struct ComparisonSession {
    slots: ImageSlots,
    send_empty_slots: bool,
    phase: Phase,
    outcome: Option<ComparisonOutcome>,
    last_error: Option<String>,
}

impl ComparisonSession {
    pub fn new(slots: ImageSlots, send_empty_slots: bool) -> Self {
        Self {
            slots,
            send_empty_slots,
            phase: Phase::Idle,
            outcome: None,
            last_error: None,
        }
    }

    pub fn slots(&self) -> &ImageSlots {
        &self.slots
    }

    pub fn set_url(&mut self, index: usize, url: impl Into<String>) -> Result<(), CompareError> {
        self.slots = self.slots.with_url(index, url)?;
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<&ComparisonOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Run a full request cycle against `comparator`.
    pub fn submit<C>(&mut self, comparator: &C) -> Result<&ComparisonOutcome, CompareError>
    where
        C: Comparator + ?Sized,
    {
        let pending = self.begin()?;
        let result = comparator.compare(&pending.urls());
        self.settle(pending, result)
    }

    /// Clear old results and mark a request as in flight.
    pub fn begin(&mut self) -> Result<PendingComparison, CompareError> {
        if self.phase == Phase::Pending {
            return Err(CompareError::Busy);
        }
        self.outcome = None;
        self.last_error = None;

        let valid = self.slots.valid();
        if valid.is_empty() {
            let err = CompareError::NoValidInput;
            self.last_error = Some(err.user_message());
            return Err(err);
        }

        let images: Vec<ComparedImage> = if self.send_empty_slots {
            self.slots
                .raw()
                .iter()
                .enumerate()
                .map(|(slot, url)| ComparedImage {
                    slot,
                    url: url.trim().to_string(),
                })
                .collect()
        } else {
            valid
                .iter()
                .map(|v| ComparedImage {
                    slot: v.index,
                    url: v.url.clone(),
                })
                .collect()
        };

        info!("Comparing {} image(s)", valid.len());
        self.phase = Phase::Pending;
        Ok(PendingComparison {
            images,
            all_identical: valid.len() > 1 && self.slots.distinct_valid_count() == 1,
        })
    }

    /// Record the service result for `pending`, replacing all result state.
    pub fn settle(
        &mut self,
        pending: PendingComparison,
        result: Result<ServiceResponse, CompareError>,
    ) -> Result<&ComparisonOutcome, CompareError> {
        self.phase = Phase::Idle;
        match result.and_then(|response| build_outcome(pending, response)) {
            Ok(outcome) => {
                info!(
                    "{} of {} image(s) matched",
                    outcome.matched_images(),
                    outcome.images.len()
                );
                let outcome: &ComparisonOutcome = self.outcome.insert(outcome);
                Ok(outcome)
            }
            Err(err) => {
                warn!("Comparison failed: {}", err);
                self.outcome = None;
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }
}

fn build_outcome(
    pending: PendingComparison,
    response: ServiceResponse,
) -> Result<ComparisonOutcome, CompareError> {
    let sent = pending.images.len();
    if response.matrix.len() != sent {
        return Err(MatchError::ShapeMismatch {
            what: "matrix",
            expected: (sent, sent),
            found: (response.matrix.len(), response.matrix.len()),
        }
        .into());
    }

    let summaries = aggregate_with(&response.matrix, &response.distances, &LogObserver)?;

    if pending.all_identical {
        let filled: Vec<usize> = pending
            .images
            .iter()
            .enumerate()
            .filter(|(_, img)| !img.url.is_empty())
            .map(|(i, _)| i)
            .collect();
        let disagrees = filled
            .iter()
            .any(|&i| filled.iter().any(|&j| i != j && !response.matrix.get(i, j)));
        if disagrees {
            warn!("All submitted URLs are identical but the service reported a non-match");
        }
    }

    Ok(ComparisonOutcome {
        images: pending.images,
        matrix: response.matrix,
        distances: response.distances,
        threshold: response.threshold,
        summaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Fake {
        reply: Result<ServiceResponse, CompareError>,
        seen: RefCell<Vec<Vec<String>>>,
    }

    impl Fake {
        fn new(reply: Result<ServiceResponse, CompareError>) -> Self {
            Self {
                reply,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Comparator for Fake {
        fn compare(&self, urls: &[String]) -> Result<ServiceResponse, CompareError> {
            self.seen.borrow_mut().push(urls.to_vec());
            self.reply.clone()
        }
    }

    fn response(m: Vec<Vec<bool>>, d: Vec<Vec<f64>>) -> ServiceResponse {
        ServiceResponse {
            matrix: ComparisonMatrix::from_rows(m).unwrap(),
            distances: DistanceMatrix::from_rows(d).unwrap(),
            threshold: Some(0.25),
        }
    }

    fn two_matching() -> ServiceResponse {
        response(
            vec![vec![false, true], vec![true, false]],
            vec![vec![0.0, 0.2], vec![0.2, 0.0]],
        )
    }

    fn session(urls: [&str; 4], send_empty: bool) -> ComparisonSession {
        ComparisonSession::new(ImageSlots::from_urls(urls).unwrap(), send_empty)
    }

    #[test]
    fn empty_slots_are_filtered_and_mapped_back() {
        let mut s = session(["", " https://a/1 ", "", "https://a/2"], false);
        let fake = Fake::new(Ok(two_matching()));
        let outcome = s.submit(&fake).unwrap();
        assert_eq!(
            outcome.images.iter().map(|i| i.slot).collect::<Vec<_>>(),
            vec![1, 3]
        );
        assert_eq!(outcome.summaries[0].matches, vec![1]);
        assert_eq!(
            fake.seen.borrow()[0],
            vec!["https://a/1".to_string(), "https://a/2".to_string()]
        );
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.last_error().is_none());
    }

    #[test]
    fn send_empty_slots_keeps_all_four() {
        let mut s = session(["https://a/1", "", "https://a/2", ""], true);
        let fake = Fake::new(Ok(response(vec![vec![false; 4]; 4], vec![vec![0.5; 4]; 4])));
        let outcome = s.submit(&fake).unwrap();
        assert_eq!(outcome.images.len(), 4);
        assert_eq!(fake.seen.borrow()[0].len(), 4);
        assert_eq!(fake.seen.borrow()[0][1], "");
    }

    #[test]
    fn no_valid_input_sends_nothing() {
        let mut s = session(["", "  ", "", ""], false);
        let fake = Fake::new(Ok(two_matching()));
        assert_eq!(s.submit(&fake).unwrap_err(), CompareError::NoValidInput);
        assert!(fake.seen.borrow().is_empty());
        assert_eq!(
            s.last_error(),
            Some("Please enter at least one valid image URL")
        );
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn second_begin_while_pending_is_busy() {
        let mut s = session(["https://a/1", "https://a/2", "", ""], false);
        let pending = s.begin().unwrap();
        assert_eq!(s.phase(), Phase::Pending);
        assert_eq!(s.begin().unwrap_err(), CompareError::Busy);
        s.settle(pending, Ok(two_matching())).unwrap();
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.begin().is_ok());
    }

    #[test]
    fn failure_clears_previous_outcome() {
        let mut s = session(["https://a/1", "https://a/2", "", ""], false);
        s.submit(&Fake::new(Ok(two_matching()))).unwrap();
        assert!(s.outcome().is_some());

        let failing = Fake::new(Err(CompareError::TransportFailure("refused".into())));
        assert!(s.submit(&failing).is_err());
        assert!(s.outcome().is_none());
        assert!(s
            .last_error()
            .unwrap()
            .starts_with("Cannot connect to backend server"));
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn matrix_size_must_match_images_sent() {
        let mut s = session(["https://a/1", "https://a/2", "https://a/3", ""], false);
        let err = s.submit(&Fake::new(Ok(two_matching()))).unwrap_err();
        assert!(matches!(
            err,
            CompareError::Malformed(MatchError::ShapeMismatch {
                expected: (3, 3),
                found: (2, 2),
                ..
            })
        ));
        assert!(s.outcome().is_none());
    }

    #[test]
    fn identical_urls_trust_the_service() {
        let mut s = session(["https://a/same", "https://a/same", "", ""], false);
        let reply = response(
            vec![vec![false, false], vec![false, false]],
            vec![vec![0.0, 0.6], vec![0.6, 0.0]],
        );
        let outcome = s.submit(&Fake::new(Ok(reply))).unwrap();
        assert!(outcome.summaries.iter().all(|s| !s.has_match));
    }

    #[test]
    fn set_url_updates_slots() {
        let mut s = ComparisonSession::new(ImageSlots::new(), false);
        s.set_url(0, "https://a/1").unwrap();
        assert_eq!(s.slots().filled_count(), 1);
        assert!(s.set_url(9, "x").is_err());
    }
}
