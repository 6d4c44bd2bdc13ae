//! [`Error`] and related items.

/// Boxed error produced by caller-supplied code or by a producer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The single error type carried by `on_error` notifications.
///
/// Each failure source has its own variant, the original failure is kept as the
/// [`source`](std::error::Error::source).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The key selector failed.
    #[error("key selector failed")]
    KeySelector(#[source] BoxError),
    /// The value selector failed.
    #[error("value selector failed")]
    ValueSelector(#[source] BoxError),
    /// The mapping factory failed.
    #[error("mapping factory failed")]
    MapFactory(#[source] BoxError),
    /// The per-key collection factory failed.
    #[error("collection factory failed")]
    CollectionFactory(#[source] BoxError),
    /// The producer reported a failure.
    #[error("upstream failed")]
    Upstream(#[source] BoxError),
    /// A subscriber requested zero items.
    #[error("invalid request of {0} items, must be positive")]
    InvalidRequest(u64),
    /// The publisher terminated without producing a value.
    #[error("completed without a value")]
    NoValue,
}

impl Error {
    /// Wraps a producer failure as [`Error::Upstream`].
    pub fn upstream(error: impl Into<BoxError>) -> Self {
        Self::Upstream(error.into())
    }

    /// Returns the stage that failed, if this error came from caller-supplied code.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::KeySelector(_) => Some(Stage::KeySelector),
            Self::ValueSelector(_) => Some(Stage::ValueSelector),
            Self::MapFactory(_) => Some(Stage::MapFactory),
            Self::CollectionFactory(_) => Some(Stage::CollectionFactory),
            Self::Upstream(_) | Self::InvalidRequest(_) | Self::NoValue => None,
        }
    }
}

/// Which piece of caller-supplied code is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// [`KeySelector`](crate::KeySelector).
    KeySelector,
    /// [`ValueSelector`](crate::ValueSelector).
    ValueSelector,
    /// [`MapFactory`](crate::MapFactory).
    MapFactory,
    /// [`CollectionFactory`](crate::CollectionFactory).
    CollectionFactory,
}

impl Stage {
    /// Wraps `source` in the [`Error`] variant for this stage.
    pub fn error(self, source: BoxError) -> Error {
        match self {
            Self::KeySelector => Error::KeySelector(source),
            Self::ValueSelector => Error::ValueSelector(source),
            Self::MapFactory => Error::MapFactory(source),
            Self::CollectionFactory => Error::CollectionFactory(source),
        }
    }
}

/// Source error for caller-supplied code that panicked instead of returning an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("panicked: {message}")]
pub struct Panicked {
    /// The panic payload, if it was a string.
    pub message: String,
}

#[cfg(test)]
mod test {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_stage_round_trip() {
        for stage in [
            Stage::KeySelector,
            Stage::ValueSelector,
            Stage::MapFactory,
            Stage::CollectionFactory,
        ] {
            assert_eq!(Some(stage), stage.error("boom".into()).stage());
        }
        assert_eq!(None, Error::upstream("boom").stage());
        assert_eq!(None, Error::NoValue.stage());
    }

    #[test]
    fn test_source_is_kept() {
        let error = Stage::KeySelector.error("Forced failure".into());
        assert_eq!("key selector failed", error.to_string());
        assert_eq!("Forced failure", error.source().unwrap().to_string());
    }
}
