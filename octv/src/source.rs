// Octv
// Copyright (c) 2026 The Octv Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The byte source: an opaque "read exactly one record" pull capability.
//!
//! Per the format's scope, the byte source itself is not part of the core: this module only
//! defines the trait the parser pulls through, plus a blanket adapter over `std::io::Read` so
//! callers can hand in a `File`, a `Cursor<&[u8]>`, a `TcpStream`, or anything else that already
//! implements it — mirroring `symphonia-core`'s `impl<T: std::io::Read> Read for T` shim.

use std::io::{self, Read};

/// The outcome of pulling one 8-byte record cell from the byte source.
pub enum RecordRead {
    /// A full 8-byte record cell was read.
    Full([u8; 8]),
    /// The source reached a clean end-of-stream before any byte of a new record was read.
    Eof,
}

/// A source of Octv record cells.
///
/// `read_record` reduces every I/O outcome to exactly the three cases the format's error model
/// distinguishes: a full record, a clean between-records EOF, or a hard failure (including a short
/// read, which per the format's design is always reported as `FERROR`, never `EOF`).
pub trait RecordSource {
    /// Reads exactly one 8-byte record cell, or reports why one could not be read.
    fn read_record(&mut self) -> io::Result<RecordRead>;
}

impl<R: Read + ?Sized> RecordSource for R {
    fn read_record(&mut self) -> io::Result<RecordRead> {
        let mut bytes = [0u8; 8];
        let mut filled = 0;

        while filled < bytes.len() {
            match self.read(&mut bytes[filled..]) {
                Ok(0) if filled == 0 => return Ok(RecordRead::Eof),
                Ok(0) => {
                    // Bytes were consumed for this record, but the source ran dry before
                    // completing it: per the format's design, this is always FERROR, never EOF.
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "short read mid-record",
                    ));
                }
                Ok(n) => filled += n,
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(RecordRead::Full(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_one_record_from_a_slice() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 9, 9];
        let mut cursor = Cursor::new(&data[..]);

        match cursor.read_record().unwrap() {
            RecordRead::Full(bytes) => assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8]),
            RecordRead::Eof => panic!("expected a full record"),
        }
    }

    #[test]
    fn clean_eof_between_records() {
        let mut cursor = Cursor::new(&[][..]);
        assert!(matches!(cursor.read_record().unwrap(), RecordRead::Eof));
    }

    #[test]
    fn short_read_mid_record_is_an_error_not_eof() {
        let data = [1u8, 2, 3];
        let mut cursor = Cursor::new(&data[..]);
        let err = cursor.read_record().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
