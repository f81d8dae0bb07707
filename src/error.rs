// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur in the library.

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                pub(crate) fn $ctor(desc: impl Into<String>) -> crate::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                    }
                }
            )*
        }
    };
}

ErrorKind!(
    (CycleDetected, cycle_detected),
    (DanglingReference, dangling_reference),
    (DuplicateId, duplicate_id),
    (Internal, internal),
    (InvalidOperation, invalid_operation),
    (InvalidSeries, invalid_series),
    (MalformedDocument, malformed_document),
    (ObjectNotFound, object_not_found),
    (UnitMismatch, unit_mismatch),
    (UnknownType, unknown_type)
);

/// An error that can occur while parsing, mutating, querying or evaluating a
/// facility graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
}

impl Error {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human readable description of the error.
    pub fn description(&self) -> &str {
        &self.desc
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::malformed_document(format!("Invalid JSON: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::duplicate_id("Node with id Pump1 already exists in WWTP.");
        assert_eq!(err.kind(), ErrorKind::DuplicateId);
        assert_eq!(
            err.to_string(),
            "DuplicateId: Node with id Pump1 already exists in WWTP."
        );
    }

    #[test]
    fn test_from_serde_json() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
        assert!(err.description().starts_with("Invalid JSON: "));
    }
}
