use std::sync::Arc;

use thiserror::Error;

/// Shared underlying cause of a [`Failure`]. Shared so that failures stay `Clone`
/// while they are fanned out to every observer of an outcome cell.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Why an outcome cell does not hold a value
#[derive(Debug, Clone, Error)]
pub enum Failure {
    /// Placeholder for a result that has not arrived yet
    #[error("not yet loaded")]
    NotLoaded,

    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("decode error: {message}")]
    Decode {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("parse error: {message}")]
    Parse {
        message: String,
        #[source]
        cause: Option<Cause>,
    },

    #[error("{0}")]
    Other(String),
}

impl Failure {
    pub fn network(message: impl Into<String>) -> Self { Failure::Network { message: message.into(), cause: None } }
    pub fn decode(message: impl Into<String>) -> Self { Failure::Decode { message: message.into(), cause: None } }
    pub fn parse(message: impl Into<String>) -> Self { Failure::Parse { message: message.into(), cause: None } }

    /// Attach an underlying cause. No-op for variants that carry none.
    pub fn caused_by<E>(self, error: E) -> Self
    where E: std::error::Error + Send + Sync + 'static {
        let cause: Option<Cause> = Some(Arc::new(error));
        match self {
            Failure::Network { message, .. } => Failure::Network { message, cause },
            Failure::Decode { message, .. } => Failure::Decode { message, cause },
            Failure::Parse { message, .. } => Failure::Parse { message, cause },
            other => other,
        }
    }

    pub fn is_not_loaded(&self) -> bool { matches!(self, Failure::NotLoaded) }

    /// The attached cause, if any
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            Failure::Network { cause, .. } | Failure::Decode { cause, .. } | Failure::Parse { cause, .. } => cause.as_ref(),
            Failure::NotLoaded | Failure::Other(_) => None,
        }
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self { Failure::Other(message) }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self { Failure::Other(message.to_owned()) }
}

/// Errors returned when forwarding work to a dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("dispatcher {0} is closed")]
    Closed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display() {
        assert_eq!(Failure::NotLoaded.to_string(), "not yet loaded");
        assert_eq!(Failure::network("timed out").to_string(), "network error: timed out");
        assert_eq!(Failure::from("could not load zen").to_string(), "could not load zen");
        assert_eq!(DispatchError::Closed("main".into()).to_string(), "dispatcher main is closed");
    }

    #[test]
    fn test_cause_is_shared_by_clones() {
        let utf8 = String::from_utf8(vec![0xff]).unwrap_err();
        let failure = Failure::decode("zen is not utf-8").caused_by(utf8);
        let copy = failure.clone();

        let (Some(a), Some(b)) = (failure.cause(), copy.cause()) else { panic!("cause should be attached") };
        assert!(Arc::ptr_eq(a, b));
        assert!(failure.source().is_some());
        assert!(Failure::Other("x".into()).caused_by(std::fmt::Error).cause().is_none());
    }
}
