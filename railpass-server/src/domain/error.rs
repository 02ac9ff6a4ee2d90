//! Domain error types.
//!
//! These errors represent validation failures when building journey legs.
//! They are distinct from browser and API errors.

/// Domain-level errors for leg validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid leg construction
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// No fare class has a price
    #[error("leg is sold out in every class")]
    SoldOut,

    /// Arrival timestamp precedes departure
    #[error("arrival is before departure")]
    ArrivalBeforeDeparture,

    /// Segment count below one
    #[error("leg must have at least one segment")]
    ZeroSegments,

    /// Sub-segment list does not agree with the segment count
    #[error("leg has {count} segments but {details} sub-segment details")]
    SubSegmentMismatch { count: u32, details: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidLeg("origin equals destination");
        assert_eq!(err.to_string(), "invalid leg: origin equals destination");

        assert_eq!(
            DomainError::SoldOut.to_string(),
            "leg is sold out in every class"
        );
        assert_eq!(
            DomainError::ArrivalBeforeDeparture.to_string(),
            "arrival is before departure"
        );
        assert_eq!(
            DomainError::ZeroSegments.to_string(),
            "leg must have at least one segment"
        );
        assert_eq!(
            DomainError::SubSegmentMismatch {
                count: 2,
                details: 0
            }
            .to_string(),
            "leg has 2 segments but 0 sub-segment details"
        );
    }
}
