use std::collections::HashSet;

use crate::error::CompareError;

pub const SLOT_COUNT: usize = 4;

/// The four image URL inputs, in the order the user entered them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSlots {
    urls: [String; SLOT_COUNT],
}

/// A slot that holds a usable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSlot {
    pub index: usize,
    pub url: String,
}

impl ImageSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_urls<I, S>(urls: I) -> Result<Self, CompareError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.len() > SLOT_COUNT {
            return Err(CompareError::TooManyUrls { given: urls.len() });
        }
        urls.into_iter()
            .enumerate()
            .try_fold(Self::new(), |slots, (idx, url)| slots.with_url(idx, url))
    }

    /// Returns a copy with slot `index` replaced.
    pub fn with_url(&self, index: usize, url: impl Into<String>) -> Result<Self, CompareError> {
        if index >= SLOT_COUNT {
            return Err(CompareError::SlotOutOfRange { index });
        }
        let mut next = self.clone();
        next.urls[index] = url.into();
        Ok(next)
    }

    pub fn raw(&self) -> &[String; SLOT_COUNT] {
        &self.urls
    }

    /// Trimmed, non-empty slots in slot order.
    pub fn valid(&self) -> Vec<ValidSlot> {
        self.urls
            .iter()
            .enumerate()
            .filter_map(|(index, url)| {
                let url = url.trim();
                (!url.is_empty()).then(|| ValidSlot {
                    index,
                    url: url.to_string(),
                })
            })
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.urls.iter().filter(|u| !u.trim().is_empty()).count()
    }

    pub fn distinct_valid_count(&self) -> usize {
        self.urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect::<HashSet<_>>()
            .len()
    }
}
