// Octv
// Copyright (c) 2026 The Octv Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The class parser: pulls records from a byte source and dispatches one callback per kind.

use std::ops::ControlFlow;

use crate::errors::{OctvError, StopCode};
use crate::record::{Config, ConfigFeature, Delimiter, Feature, Moment, Record, Tick};
use crate::source::{RecordRead, RecordSource};

/// The return type of every [`ClassCallbacks`] method: `Continue(())` resumes parsing, `Break(code)`
/// halts the parser immediately and propagates `code` to the caller.
///
/// This is the idiomatic-Rust shape of the wire format's "return 0 to continue, anything else to
/// stop" callback contract — [`std::ops::ControlFlow`] is the standard library type built for
/// exactly this pattern.
pub type Flow = ControlFlow<i32>;

/// One callback per record kind, plus an error callback, dispatched by [`parse_class`].
///
/// Every method has a default implementation equivalent to an omitted (null) callback in the
/// format's reference design: each kind callback default-continues with no side effect, and
/// [`ClassCallbacks::error`] defaults to propagating the error's own code, i.e. behaving as if no
/// `error_cb` were installed.
pub trait ClassCallbacks {
    fn sentinel(&mut self, _sentinel: &Delimiter) -> Flow {
        Flow::Continue(())
    }

    /// Absence of an override still halts the parser on a valid `End` record — termination on
    /// `End` is the class parser's own behavior, not something a callback opts into. Returning
    /// `Continue(())` here is reported to the caller as stop code `0`.
    fn end(&mut self, _end: &Delimiter) -> Flow {
        Flow::Continue(())
    }

    fn config(&mut self, _config: &Config) -> Flow {
        Flow::Continue(())
    }

    fn config_feature(&mut self, _config_feature: &ConfigFeature) -> Flow {
        Flow::Continue(())
    }

    fn moment(&mut self, _moment: &Moment) -> Flow {
        Flow::Continue(())
    }

    fn tick(&mut self, _tick: &Tick) -> Flow {
        Flow::Continue(())
    }

    fn feature(&mut self, _feature: &Feature) -> Flow {
        Flow::Continue(())
    }

    /// Called for every decode failure with the offending record's bytes attached. The default
    /// propagates the error's own reserved code, matching "if `error_cb` is absent, the decode
    /// error code is returned directly".
    fn error(&mut self, err: &OctvError) -> Flow {
        Flow::Break(err.code())
    }
}

/// Pulls records from `source` in a loop, dispatching each to the matching [`ClassCallbacks`]
/// method, until a valid `End` record is seen, a callback halts the parser, or the byte source is
/// exhausted or fails.
///
/// Structural checks (type code recognition) precede semantic checks (signature, version) within
/// [`Record::decode`]. A single record produces at most one call to
/// [`ClassCallbacks::error`].
pub fn parse_class<S, C>(source: &mut S, callbacks: &mut C) -> StopCode
where
    S: RecordSource + ?Sized,
    C: ClassCallbacks + ?Sized,
{
    loop {
        let bytes = match source.read_record() {
            Ok(RecordRead::Full(bytes)) => bytes,
            Ok(RecordRead::Eof) => {
                // A read failure is a notification, not a decision: error_cb's return is ignored.
                let err = OctvError::Eof;
                log::debug!("octv: clean eof between records");
                let _ = callbacks.error(&err);
                return StopCode::Eof;
            }
            Err(io_err) => {
                let err = OctvError::FError(io_err);
                log::debug!("octv: read failure mid-record: {err}");
                let _ = callbacks.error(&err);
                return StopCode::FError;
            }
        };

        match Record::decode(bytes) {
            Ok(Record::End(end)) => {
                log::trace!("octv: End");
                return match callbacks.end(&end) {
                    Flow::Continue(()) => StopCode::Ok,
                    Flow::Break(code) => StopCode::EndClient(code),
                };
            }
            Ok(Record::Sentinel(sentinel)) => {
                log::trace!("octv: Sentinel");
                if let Flow::Break(code) = callbacks.sentinel(&sentinel) {
                    return StopCode::Client(code);
                }
            }
            Ok(Record::Config(config)) => {
                log::trace!("octv: Config {config:?}");
                if let Flow::Break(code) = callbacks.config(&config) {
                    return StopCode::Client(code);
                }
            }
            Ok(Record::ConfigFeature(config_feature)) => {
                log::trace!("octv: ConfigFeature {config_feature:?}");
                if let Flow::Break(code) = callbacks.config_feature(&config_feature) {
                    return StopCode::Client(code);
                }
            }
            Ok(Record::Moment(moment)) => {
                log::trace!("octv: Moment {moment:?}");
                if let Flow::Break(code) = callbacks.moment(&moment) {
                    return StopCode::Client(code);
                }
            }
            Ok(Record::Tick(tick)) => {
                log::trace!("octv: Tick {tick:?}");
                if let Flow::Break(code) = callbacks.tick(&tick) {
                    return StopCode::Client(code);
                }
            }
            Ok(Record::Feature(feature)) => {
                log::trace!("octv: Feature {feature:?}");
                if let Flow::Break(code) = callbacks.feature(&feature) {
                    return StopCode::Client(code);
                }
            }
            Err(err) => match callbacks.error(&err) {
                Flow::Continue(()) => {
                    log::debug!("octv: discarding record after error_cb continue: {err}");
                    continue;
                }
                Flow::Break(code) => return stop_from_break(&err, code),
            },
        }
    }
}

/// Represents a non-zero code returned from `error_cb` as the parser's own named `StopCode` when
/// it matches the error's reserved code (i.e. the callback behaved as if absent), or as a
/// client-chosen code otherwise.
fn stop_from_break(err: &OctvError, code: i32) -> StopCode {
    if code == err.code() {
        StopCode::from_error(err)
    }
    else {
        StopCode::Client(code)
    }
}
