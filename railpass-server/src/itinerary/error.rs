//! Itinerary errors.

/// Misuse of the itinerary. The itinerary is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItineraryError {
    #[error("no saved segment {0}")]
    UnknownSegment(u32),

    #[error("no search {0}")]
    UnknownSearch(u32),

    /// The leg is not among the search's results
    #[error("search {search} has no such result")]
    LegNotInSearch { search: u32 },

    #[error("segment {segment} has no neighbour to swap with")]
    CannotSwap { segment: u32 },

    /// Segment numbering would overflow
    #[error("itinerary has no room for more segments")]
    Full,

    /// Only reported when checking a loaded itinerary
    #[error("itinerary is inconsistent: {0}")]
    InvariantViolated(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(ItineraryError::UnknownSegment(4).to_string(), "no saved segment 4");
        assert_eq!(
            ItineraryError::LegNotInSearch { search: 2 }.to_string(),
            "search 2 has no such result"
        );
    }
}
