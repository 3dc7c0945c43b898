//! Error type shared by every stage of the pipeline.
//!
//! Only [`Error::Acquisition`] is recoverable: the pipeline answers it with the
//! configured default estimate. The other variants mean an internal invariant
//! was violated and the run stops.

/// Errors produced by `biasgrid`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The dataset could not be resolved, downloaded, located or read.
    #[error("dataset acquisition failed: {reason}")]
    Acquisition { reason: String },

    /// An input violated a precondition (empty labels, bad probability, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A ratio was requested over a zero total.
    #[error("division by zero: {0}")]
    DivideByZero(&'static str),
}

impl Error {
    pub(crate) fn acquisition(reason: impl Into<String>) -> Self {
        Error::Acquisition {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// True when the caller may substitute a default and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Acquisition { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_acquisition_is_recoverable() {
        assert!(Error::acquisition("offline").is_recoverable());
        assert!(!Error::invalid("empty").is_recoverable());
        assert!(!Error::DivideByZero("zero trials").is_recoverable());
    }

    #[test]
    fn messages_carry_context() {
        let e = Error::acquisition("no y_*.npy under /tmp/x");
        assert_eq!(
            e.to_string(),
            "dataset acquisition failed: no y_*.npy under /tmp/x"
        );
    }
}
