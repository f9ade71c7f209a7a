//! Errors reported by the runtime.
//!
//! Everything here is recoverable: an error aborts the top-level evaluation
//! that raised it and leaves the heap and the root set consistent. The only
//! fatal conditions (a corrupted root set) panic instead of producing an
//! [`Error`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    #[error("{name}: incorrect number of arguments, expected {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("malformed {form} form: {reason}")]
    MalformedForm { form: &'static str, reason: String },

    #[error("type error: expected {expected}, got {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}: division by zero")]
    DivisionByZero(&'static str),

    #[error("{0}: integer overflow")]
    Overflow(&'static str),

    #[error("allocator exhausted: {arenas} arenas of {capacity} slots are full")]
    AllocatorExhausted { arenas: usize, capacity: usize },

    #[error("stale reference to reclaimed slot {arena}:{index}")]
    StaleHandle { arena: u32, index: u32 },

    #[error("read error at offset {offset}: {message}")]
    Read { message: String, offset: usize },
}

impl Error {
    pub fn malformed(form: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedForm {
            form,
            reason: reason.into(),
        }
    }

    pub fn read(message: impl Into<String>, offset: usize) -> Self {
        Error::Read {
            message: message.into(),
            offset,
        }
    }

    /// Whether the front end should keep the session alive after reporting.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::StaleHandle { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = Error::UnboundVariable("x".into());
        assert_eq!(err.to_string(), "unbound variable: x");

        let err = Error::ArityMismatch {
            name: "cons".into(),
            expected: 2,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "cons: incorrect number of arguments, expected 2, got 3"
        );
    }

    #[test]
    fn exhaustion_is_recoverable() {
        let err = Error::AllocatorExhausted {
            arenas: 1,
            capacity: 8,
        };
        assert!(err.is_recoverable());
        assert!(!Error::StaleHandle { arena: 0, index: 1 }.is_recoverable());
    }
}
