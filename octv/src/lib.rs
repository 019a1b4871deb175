// Octv
// Copyright (c) 2026 The Octv Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A streaming decoder and dispatcher for the Octv Sparse Stream wire format.
//!
//! Octv Sparse Stream is an 8-byte-record, tagged-union format for sparse per-channel audio
//! detector events: a fixed audio configuration and detector configuration up front, then a
//! sparse interleaving of coarse (`Moment`) and fine (`Tick`) timeline cursors with detector
//! `Feature` events attached to the most recent cursor.
//!
//! Two parsing layers are exposed, at two different levels of the format's own abstraction:
//!
//! - [`class`] decodes the stream one record at a time and dispatches a callback per record kind,
//!   with no cross-record bookkeeping. This is the lowest-level entry point, closest to the wire.
//! - [`flat`] builds on [`class`] and folds the sticky `Config`/`ConfigFeature`/`Moment`/`Tick`
//!   state into each `Feature` record, handing callers one self-contained, denormalized event per
//!   detector feature. Most callers want this layer.
//!
//! Both layers pull bytes through the [`source::RecordSource`] trait, which is implemented for
//! any [`std::io::Read`], so a [`std::fs::File`], a [`std::io::Cursor`], or a `TcpStream` all work
//! as a byte source without adapter code.
//!
//! ```no_run
//! use octv::flat::{parse_flat, FlatCallbacks, FlatFeature};
//! use octv::class::Flow;
//!
//! struct Counter(u64);
//!
//! impl FlatCallbacks for Counter {
//!     fn flat_feature(&mut self, _feature: &FlatFeature) -> Flow {
//!         self.0 += 1;
//!         Flow::Continue(())
//!     }
//! }
//!
//! # fn run(mut source: impl std::io::Read) {
//! let mut counter = Counter(0);
//! let stop = parse_flat(&mut source, &mut counter);
//! println!("{} features, stopped with {stop}", counter.0);
//! # }
//! ```

pub mod class;
pub mod constants;
pub mod errors;
pub mod flat;
pub mod record;
pub mod source;

pub use errors::{DecodeResult, OctvError, StopCode, ValueErrorKind};
pub use record::Record;
