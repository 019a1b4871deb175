// Octv
// Copyright (c) 2026 The Octv Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The 8-byte tagged-union record format: types and the byte-to-variant decoder.

use crate::constants::*;
use crate::errors::{OctvError, ValueErrorKind};

/// A `Sentinel` or `End` delimiter record.
///
/// The three ASCII characters and the fixed 4-byte signature are carried verbatim; by the time a
/// `Delimiter` exists both have already been validated against the expected value for its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter {
    pub chars: [u8; 3],
    pub signature: [u8; 4],
}

/// Audio configuration. Sticky until a later `Config` replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub version: u8,
    pub num_audio_channels: u8,
    pub audio_sample_rate: i32,
}

/// Detector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigFeature {
    pub max_abs_level_int8: i8,
    pub max_abs_level_int16: i16,
    pub max_num_detectors: u16,
}

/// Coarse time cursor: the high bits of the composite audio frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub audio_frame_index_hi_bytes: u32,
}

/// Fine time cursor: the low bits of the composite audio frame index, plus the most recent sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub audio_channel: u8,
    pub audio_frame_index_lo_bytes: u16,
    pub audio_sample: f32,
}

/// The tier-specific payload of a `Feature` record, selected by the sub-range of its type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeaturePayload {
    /// `0x01..0x20`.
    Tier0 { level_0_int8_0: i8, level_0_int8_1: i8, level_0_int8_2: i8, level_0_int8_3: i8 },
    /// `0x20..0x30`.
    Tier2 { level_2_int8_0: i8, level_2_int8_1: i8, level_2_int16_0: i16 },
    /// `0x30..0x40`.
    Tier3 { level_3_int16_0: i16, level_3_int16_1: i16 },
}

/// A detector feature event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    /// The raw type code (`0x01..=0x3f`), also known as the detector type.
    pub detector_type: u8,
    /// Offset, in audio frames, from the most recent `Tick`'s timeline position.
    pub frame_offset: i8,
    pub detector_index: u16,
    pub payload: FeaturePayload,
}

/// A single decoded Octv record: one variant per terminal in the grammar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record {
    Sentinel(Delimiter),
    End(Delimiter),
    Config(Config),
    ConfigFeature(ConfigFeature),
    Moment(Moment),
    Tick(Tick),
    Feature(Feature),
}

impl Record {
    /// Decodes an 8-byte record cell, selecting the variant by its type code (byte 0) and
    /// validating the structural and semantic invariants for that variant.
    ///
    /// Structural checks (type code recognition) precede semantic checks (signature, version),
    /// matching the error-handling ordering of the format's reference design.
    pub fn decode(bytes: [u8; 8]) -> Result<Record, OctvError> {
        let type_code = bytes[0];

        if is_feature_candidate(type_code) {
            return decode_feature(type_code, bytes);
        }

        match type_code {
            SENTINEL_TYPE => decode_delimiter(bytes, &SENTINEL_CHARS, Record::Sentinel),
            END_TYPE => decode_delimiter(bytes, &END_CHARS, Record::End),
            CONFIG_TYPE => decode_config(bytes),
            CONFIG_FEATURE_TYPE => decode_config_feature(bytes),
            MOMENT_TYPE => decode_moment(bytes),
            TICK_TYPE => decode_tick(bytes),
            _ => Err(OctvError::Type { bytes }),
        }
    }
}

fn decode_delimiter(
    bytes: [u8; 8],
    expected_chars: &[u8; 3],
    variant: impl FnOnce(Delimiter) -> Record,
) -> Result<Record, OctvError> {
    let chars = [bytes[1], bytes[2], bytes[3]];
    let signature = [bytes[4], bytes[5], bytes[6], bytes[7]];

    if chars != *expected_chars {
        return Err(OctvError::Value { kind: ValueErrorKind::BadDelimiterChars, bytes: Some(bytes) });
    }
    if signature != DELIMITER_SIGNATURE {
        return Err(OctvError::Value { kind: ValueErrorKind::BadSignature, bytes: Some(bytes) });
    }

    Ok(variant(Delimiter { chars, signature }))
}

fn decode_config(bytes: [u8; 8]) -> Result<Record, OctvError> {
    let version = bytes[1];
    if version != OCTV_VERSION {
        return Err(OctvError::Value { kind: ValueErrorKind::VersionMismatch, bytes: Some(bytes) });
    }

    let num_audio_channels = bytes[2];
    // bytes[3] is reserved.
    let audio_sample_rate = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    Ok(Record::Config(Config { version, num_audio_channels, audio_sample_rate }))
}

fn decode_config_feature(bytes: [u8; 8]) -> Result<Record, OctvError> {
    let max_abs_level_int8 = bytes[1] as i8;
    // bytes[2..4] are reserved.
    let max_abs_level_int16 = i16::from_le_bytes([bytes[4], bytes[5]]);
    let max_num_detectors = u16::from_le_bytes([bytes[6], bytes[7]]);

    Ok(Record::ConfigFeature(ConfigFeature {
        max_abs_level_int8,
        max_abs_level_int16,
        max_num_detectors,
    }))
}

fn decode_moment(bytes: [u8; 8]) -> Result<Record, OctvError> {
    // bytes[1..4] are reserved.
    let audio_frame_index_hi_bytes = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    Ok(Record::Moment(Moment { audio_frame_index_hi_bytes }))
}

fn decode_tick(bytes: [u8; 8]) -> Result<Record, OctvError> {
    let audio_channel = bytes[1];
    let audio_frame_index_lo_bytes = u16::from_le_bytes([bytes[2], bytes[3]]);
    let audio_sample = f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

    Ok(Record::Tick(Tick { audio_channel, audio_frame_index_lo_bytes, audio_sample }))
}

fn decode_feature(type_code: u8, bytes: [u8; 8]) -> Result<Record, OctvError> {
    let frame_offset = bytes[1] as i8;
    let detector_index = u16::from_le_bytes([bytes[2], bytes[3]]);

    let payload = match FeatureTier::of(type_code) {
        Some(FeatureTier::Tier0) => FeaturePayload::Tier0 {
            level_0_int8_0: bytes[4] as i8,
            level_0_int8_1: bytes[5] as i8,
            level_0_int8_2: bytes[6] as i8,
            level_0_int8_3: bytes[7] as i8,
        },
        Some(FeatureTier::Tier2) => FeaturePayload::Tier2 {
            level_2_int8_0: bytes[4] as i8,
            level_2_int8_1: bytes[5] as i8,
            level_2_int16_0: i16::from_le_bytes([bytes[6], bytes[7]]),
        },
        Some(FeatureTier::Tier3) => FeaturePayload::Tier3 {
            level_3_int16_0: i16::from_le_bytes([bytes[4], bytes[5]]),
            level_3_int16_1: i16::from_le_bytes([bytes[6], bytes[7]]),
        },
        // type_code == 0x00: the only feature-candidate byte that is reserved invalid.
        None => return Err(OctvError::Type { bytes }),
    };

    Ok(Record::Feature(Feature { detector_type: type_code, frame_offset, detector_index, payload }))
}
