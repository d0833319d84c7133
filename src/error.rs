use facecmp_match::MatchError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    #[error("Please enter at least one valid image URL")]
    NoValidInput,
    #[error("at most 4 image URLs are accepted, got {given}")]
    TooManyUrls { given: usize },
    #[error("slot {index} does not exist (valid slots are 0 to 3)")]
    SlotOutOfRange { index: usize },
    #[error("could not reach comparison service: {0}")]
    TransportFailure(String),
    #[error("{0}")]
    ServiceError(String),
    #[error("malformed comparison result: {0}")]
    Malformed(#[from] MatchError),
    #[error("a comparison is already in progress")]
    Busy,
}

impl CompareError {
    /// Single message suitable for showing to the person running the comparison.
    pub fn user_message(&self) -> String {
        match self {
            Self::TransportFailure(detail) => format!(
                "Cannot connect to backend server. Please ensure the backend is running and accessible. ({detail})"
            ),
            Self::ServiceError(msg) if msg.contains("No face detected") => format!(
                "No faces were detected in one or more images. Please use clear images with visible faces. ({msg})"
            ),
            other => other.to_string(),
        }
    }
}
