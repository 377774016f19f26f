use thiserror::Error;

/// Errors from configuring and feeding a [`RateEstimator`][crate::RateEstimator].
///
/// Both variants are programmer errors. Nothing here is transient, so there is
/// no point in retrying the call that produced them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EwlrError {
    /// A time period or tick interval that can't produce a smoothing
    /// factor in `(0, 1]`.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// More lost events than observed events passed to
    /// [`RateEstimator::update`][crate::RateEstimator::update].
    #[error("invalid argument: {lost} lost exceeds {events} events")]
    InvalidArgument {
        /// Number of observed events.
        events: u64,
        /// Number of lost events.
        lost: u64,
    },
}
