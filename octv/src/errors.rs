// Octv
// Copyright (c) 2026 The Octv Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type and the parser's stop/result codes.

use std::fmt;

/// The specific semantic violation behind an [`OctvError::Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueErrorKind {
    /// A delimiter's magic signature did not match `DELIMITER_SIGNATURE`.
    BadSignature,
    /// A delimiter's three ASCII characters did not match the expected chars for its type.
    BadDelimiterChars,
    /// A `Config` record's `version` field did not equal `OCTV_VERSION`.
    VersionMismatch,
    /// A `Feature` was observed before any `Config` record.
    ConfigMissing,
    /// A `Tick` was observed before any `Moment` record.
    TickBeforeMoment,
    /// A `Feature` was observed before any `Tick` record (config and moment may be present).
    PrematureFeature,
}

impl ValueErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            ValueErrorKind::BadSignature => "bad delimiter signature",
            ValueErrorKind::BadDelimiterChars => "bad delimiter characters",
            ValueErrorKind::VersionMismatch => "config version mismatch",
            ValueErrorKind::ConfigMissing => "feature seen before any config",
            ValueErrorKind::TickBeforeMoment => "tick seen before any moment",
            ValueErrorKind::PrematureFeature => "feature seen before any tick",
        }
    }
}

/// `OctvError` enumerates every way decoding a record, or parsing a stream, can fail.
///
/// This mirrors the small integer error domain from the wire-format's C reference (`NullError`,
/// `TypeError`, `ValueError`, `EOF`, `FERROR`), but represents each as a distinct, documented
/// variant instead of a bare code.
#[derive(Debug)]
pub enum OctvError {
    /// A null byte source or callback set was supplied. Carries no offending bytes: nothing was
    /// read.
    Null,
    /// The record's type code (byte 0) is not a recognized terminal.
    Type {
        /// The 8 raw bytes of the offending record.
        bytes: [u8; 8],
    },
    /// A known record type failed a semantic check — either a structural check against the wire
    /// encoding (signature, delimiter chars, version), in which case the offending record's raw
    /// bytes are attached, or a stream-level ordering violation raised by the flat parser's state
    /// machine (see [`ValueErrorKind::ConfigMissing`] and friends), which has no single offending
    /// record to attach.
    Value {
        kind: ValueErrorKind,
        /// The 8 raw bytes of the offending record, when one exists.
        bytes: Option<[u8; 8]>,
    },
    /// The byte source reached a clean end-of-stream between records (no bytes of a new record
    /// had been consumed yet).
    Eof,
    /// The byte source failed, or returned a short read in the middle of a record.
    FError(std::io::Error),
}

impl OctvError {
    /// The wire-contract small integer this error corresponds to (see `StopCode::code`).
    pub fn code(&self) -> i32 {
        match self {
            OctvError::Null => 0x01,
            OctvError::Type { .. } => 0x02,
            OctvError::Value { .. } => 0x03,
            OctvError::Eof => 0x04,
            OctvError::FError(_) => 0x05,
        }
    }
}

impl fmt::Display for OctvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OctvError::Null => write!(f, "null byte source or callback set"),
            OctvError::Type { bytes } => {
                write!(f, "unrecognized record type code 0x{:02x}", bytes[0])
            }
            OctvError::Value { kind, bytes: Some(bytes) } => {
                write!(f, "invalid record (type 0x{:02x}): {}", bytes[0], kind.as_str())
            }
            OctvError::Value { kind, bytes: None } => {
                write!(f, "invalid stream state: {}", kind.as_str())
            }
            OctvError::Eof => write!(f, "end of stream reached between records"),
            OctvError::FError(err) => write!(f, "read failure: {}", err),
        }
    }
}

impl std::error::Error for OctvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OctvError::FError(err) => Some(err),
            _ => None,
        }
    }
}

/// The outcome of a `parse_class` or `parse_flat` call.
///
/// The C reference protocol returns a single small integer from these calls that conflates parser-
/// detected faults, I/O outcomes, and an arbitrary non-zero code a callback chose to halt with.
/// `StopCode` keeps that call-site ergonomics (`code()` recovers the original integer) while giving
/// each parser-detected outcome a distinct, matchable variant.
#[derive(Debug)]
pub enum StopCode {
    /// A valid `End` record was seen and `end_cb` returned `Continue` (or was absent).
    Ok,
    /// A valid `End` record was seen and `end_cb` returned `Break(code)`.
    EndClient(i32),
    /// The byte source or callback set was null. (Not reachable through the safe API, which takes
    /// `&mut` references; retained so `StopCode` stays a complete mirror of the wire contract.)
    Null,
    /// `error_cb` was absent, or returned `Break`, for a `TypeError`.
    Type,
    /// `error_cb` was absent, or returned `Break`, for a `ValueError`.
    Value(ValueErrorKind),
    /// Clean end-of-stream without a preceding `End` record.
    Eof,
    /// A read failure or short read mid-record.
    FError,
    /// A non-`error_cb` callback (or `error_cb` itself) returned `Break(code)` with a
    /// client-chosen, non-zero code outside the parser's own small-integer range.
    Client(i32),
}

impl StopCode {
    /// The raw wire-contract integer this outcome corresponds to. `0` for clean termination,
    /// otherwise the parser's reserved code or the client's own code.
    pub fn code(&self) -> i32 {
        match self {
            StopCode::Ok => 0,
            StopCode::EndClient(code) => *code,
            StopCode::Null => 0x01,
            StopCode::Type => 0x02,
            StopCode::Value(_) => 0x03,
            StopCode::Eof => 0x04,
            StopCode::FError => 0x05,
            StopCode::Client(code) => *code,
        }
    }

    /// `true` if the stream ended cleanly (an `End` record was seen and no callback asked to
    /// halt with a non-zero code).
    pub fn is_ok(&self) -> bool {
        matches!(self, StopCode::Ok)
    }

    pub(crate) fn from_error(err: &OctvError) -> StopCode {
        match err {
            OctvError::Null => StopCode::Null,
            OctvError::Type { .. } => StopCode::Type,
            OctvError::Value { kind, .. } => StopCode::Value(*kind),
            OctvError::Eof => StopCode::Eof,
            OctvError::FError(_) => StopCode::FError,
        }
    }
}

impl fmt::Display for StopCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCode::Ok => write!(f, "ok"),
            StopCode::EndClient(code) => write!(f, "end (client code {code})"),
            StopCode::Null => write!(f, "null source or callbacks"),
            StopCode::Type => write!(f, "unrecognized type code"),
            StopCode::Value(kind) => write!(f, "invalid value: {}", kind.as_str()),
            StopCode::Eof => write!(f, "end of stream"),
            StopCode::FError => write!(f, "read failure"),
            StopCode::Client(code) => write!(f, "client halt (code {code})"),
        }
    }
}

pub type DecodeResult<T> = Result<T, OctvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_wire_contract() {
        assert_eq!(StopCode::Ok.code(), 0);
        assert_eq!(StopCode::Null.code(), 0x01);
        assert_eq!(StopCode::Type.code(), 0x02);
        assert_eq!(StopCode::Value(ValueErrorKind::BadSignature).code(), 0x03);
        assert_eq!(StopCode::Eof.code(), 0x04);
        assert_eq!(StopCode::FError.code(), 0x05);
        assert_eq!(StopCode::Client(42).code(), 42);
    }

    #[test]
    fn is_ok_only_for_clean_end() {
        assert!(StopCode::Ok.is_ok());
        assert!(!StopCode::EndClient(0).is_ok());
        assert!(!StopCode::Eof.is_ok());
    }
}
