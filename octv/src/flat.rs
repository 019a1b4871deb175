// Octv
// Copyright (c) 2026 The Octv Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The flat parser: folds per-tier records into cumulative stream state and synthesizes a
//! denormalized [`FlatFeature`] (and, additively, a [`FlatConfig`]) per [`Feature`] record.

use crate::class::{parse_class, ClassCallbacks, Flow};
use crate::errors::{OctvError, StopCode, ValueErrorKind};
use crate::record::{Config, ConfigFeature, Feature, FeaturePayload, Moment, Tick};
use crate::source::RecordSource;

/// Audio and detector configuration folded into one record.
///
/// Synthesized once both a [`Config`] and a [`ConfigFeature`] have been seen; the sketch for this
/// lives in the format's reference header (`OctvFlatConfig`) but is never built there. See
/// `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatConfig {
    pub version: u8,
    pub num_audio_channels: u8,
    pub audio_sample_rate: i32,
    pub max_abs_level_int8: i8,
    pub max_abs_level_int16: i16,
    pub max_num_detectors: u16,
}

/// A denormalized feature event, combining a [`Feature`] with the currently-effective
/// configuration and timeline context. See §3.3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatFeature {
    // CONFIG
    pub version: u8,
    pub num_audio_channels: u8,
    pub audio_sample_rate: i32,

    // MOMENT + TICK
    /// The composite 48-bit logical frame index, narrowed to a signed 32-bit value. This is a
    /// documented precision limit: streams whose frame index exceeds `i32::MAX` wrap.
    pub audio_frame_index: i32,

    // TICK
    pub audio_channel: u8,
    pub audio_sample: f32,

    // FEATURE
    /// `frame_offset` scaled to a time delta. The format's reference source emits the unscaled
    /// placeholder `frame_offset as f32` (a comment gestures at a reciprocal-sample-rate scale
    /// that was never implemented); per `SPEC_FULL.md` §9/§C this crate keeps that placeholder
    /// rather than inventing the intended scale.
    pub audio_frame_index_offset: f32,
    pub detector_index: u16,
    pub detector_type: u8,
    pub payload: FeaturePayload,
}

/// A [`Flow`]-returning callback set for the flat parser.
///
/// Mirrors [`crate::class::ClassCallbacks`]'s contract: `Continue(())` resumes parsing,
/// `Break(code)` halts it and propagates `code`.
pub trait FlatCallbacks {
    /// Invoked once per `Feature` record, after all prerequisite context updates from that
    /// record's prefix have been applied.
    fn flat_feature(&mut self, flat_feature: &FlatFeature) -> Flow;

    /// Invoked once both `Config` and `ConfigFeature` have been seen, and again on every
    /// subsequent update to either. The default implementation ignores it (equivalent to an
    /// omitted `flat_config_cb`).
    fn flat_config(&mut self, _flat_config: &FlatConfig) -> Flow {
        Flow::Continue(())
    }

    /// Forwarded decode errors and state-machine `ValueError`s. Defaults to propagating the
    /// error's own code, i.e. behaving as if no `error_cb` were installed.
    fn error(&mut self, err: &OctvError) -> Flow {
        Flow::Break(err.code())
    }
}

#[derive(Default)]
struct Context {
    config: Option<Config>,
    config_feature: Option<ConfigFeature>,
    moment: Option<Moment>,
    tick: Option<Tick>,
}

struct FlatAdapter<'a, F: FlatCallbacks + ?Sized> {
    ctx: Context,
    flat: &'a mut F,
}

impl<'a, F: FlatCallbacks + ?Sized> FlatAdapter<'a, F> {
    fn new(flat: &'a mut F) -> Self {
        FlatAdapter { ctx: Context::default(), flat }
    }

    /// Forwards a synthesized (bytes-less) `ValueError` through the flat client's `error_cb`,
    /// translating its `Flow` into this adapter's own `Flow` to return from the `ClassCallbacks`
    /// method that detected the violation.
    fn raise(&mut self, kind: ValueErrorKind) -> Flow {
        let err = OctvError::Value { kind, bytes: None };
        log::warn!("octv: state machine violation: {err}");
        self.flat.error(&err)
    }

    fn maybe_emit_flat_config(&mut self) -> Flow {
        if let (Some(config), Some(config_feature)) = (self.ctx.config, self.ctx.config_feature) {
            let flat_config = FlatConfig {
                version: config.version,
                num_audio_channels: config.num_audio_channels,
                audio_sample_rate: config.audio_sample_rate,
                max_abs_level_int8: config_feature.max_abs_level_int8,
                max_abs_level_int16: config_feature.max_abs_level_int16,
                max_num_detectors: config_feature.max_num_detectors,
            };
            return self.flat.flat_config(&flat_config);
        }
        Flow::Continue(())
    }
}

impl<'a, F: FlatCallbacks + ?Sized> ClassCallbacks for FlatAdapter<'a, F> {
    fn config(&mut self, config: &Config) -> Flow {
        self.ctx.config = Some(*config);
        self.maybe_emit_flat_config()
    }

    fn config_feature(&mut self, config_feature: &ConfigFeature) -> Flow {
        self.ctx.config_feature = Some(*config_feature);
        self.maybe_emit_flat_config()
    }

    fn moment(&mut self, moment: &Moment) -> Flow {
        self.ctx.moment = Some(*moment);
        Flow::Continue(())
    }

    fn tick(&mut self, tick: &Tick) -> Flow {
        if self.ctx.moment.is_none() {
            return self.raise(ValueErrorKind::TickBeforeMoment);
        }
        self.ctx.tick = Some(*tick);
        Flow::Continue(())
    }

    fn feature(&mut self, feature: &Feature) -> Flow {
        let Some(config) = self.ctx.config
        else {
            return self.raise(ValueErrorKind::ConfigMissing);
        };
        let Some(tick) = self.ctx.tick
        else {
            return self.raise(ValueErrorKind::PrematureFeature);
        };
        // moment is guaranteed Some whenever tick is Some, since `tick()` refuses to populate its
        // slot without one.
        let moment = self.ctx.moment.expect("tick set without moment");

        let composite = (u64::from(moment.audio_frame_index_hi_bytes) << 16)
            | u64::from(tick.audio_frame_index_lo_bytes);

        let flat_feature = FlatFeature {
            version: config.version,
            num_audio_channels: config.num_audio_channels,
            audio_sample_rate: config.audio_sample_rate,
            audio_frame_index: composite as i32,
            audio_channel: tick.audio_channel,
            audio_sample: tick.audio_sample,
            audio_frame_index_offset: feature.frame_offset as f32,
            detector_index: feature.detector_index,
            detector_type: feature.detector_type,
            payload: feature.payload,
        };

        self.flat.flat_feature(&flat_feature)
    }

    fn error(&mut self, err: &OctvError) -> Flow {
        self.flat.error(err)
    }

    // `sentinel` and `end` are unused by the flat parser; the class parser's own End handling
    // applies regardless of what these return, so the defaults (no-op, continue) are correct.
}

/// Pulls records from `source`, folding `Config`/`ConfigFeature`/`Moment`/`Tick` into running
/// context and invoking `callbacks.flat_feature` once per `Feature` record with that context
/// combined in. See §4.3 and §4.4 ("state machine enforcement").
pub fn parse_flat<S, F>(source: &mut S, callbacks: &mut F) -> StopCode
where
    S: RecordSource + ?Sized,
    F: FlatCallbacks + ?Sized,
{
    let mut adapter = FlatAdapter::new(callbacks);
    parse_class(source, &mut adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SENTINEL: [u8; 8] = [0x4f, b'c', b't', b'v', 0xa4, 0x6d, 0xae, 0xb6];
    const END: [u8; 8] = [0x45, b'n', b'd', b' ', 0xa4, 0x6d, 0xae, 0xb6];
    const CONFIG: [u8; 8] = [0x50, 0x01, 0x01, 0x00, 0x40, 0x1f, 0x00, 0x00]; // v1, 1ch, 8000Hz
    const MOMENT: [u8; 8] = [0x60, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
    const TICK: [u8; 8] = [0x70, 0x00, 0x10, 0x00, 0x00, 0x00, 0x80, 0x3f]; // ch0, lo=0x10, 1.0f

    fn bytes_of(records: &[[u8; 8]]) -> Vec<u8> {
        records.iter().flatten().copied().collect()
    }

    #[derive(Default)]
    struct Collector {
        features: Vec<FlatFeature>,
        configs: Vec<FlatConfig>,
        errors: Vec<ValueErrorKind>,
    }

    impl FlatCallbacks for Collector {
        fn flat_feature(&mut self, flat_feature: &FlatFeature) -> Flow {
            self.features.push(*flat_feature);
            Flow::Continue(())
        }
        fn flat_config(&mut self, flat_config: &FlatConfig) -> Flow {
            self.configs.push(*flat_config);
            Flow::Continue(())
        }
        fn error(&mut self, err: &OctvError) -> Flow {
            if let OctvError::Value { kind, .. } = err {
                self.errors.push(*kind);
            }
            Flow::Continue(())
        }
    }

    #[test]
    fn tier0_feature_flattens_with_full_context() {
        let feature = [0x05, 0x02, 0x07, 0x00, 0x11, 0x22, 0x33, 0x44];
        let data = bytes_of(&[SENTINEL, CONFIG, MOMENT, TICK, feature, END]);
        let mut cursor = Cursor::new(data);
        let mut cb = Collector::default();

        let stop = parse_flat(&mut cursor, &mut cb);

        assert!(stop.is_ok());
        assert_eq!(cb.features.len(), 1);
        let ff = cb.features[0];
        assert_eq!(ff.audio_frame_index, 65552);
        assert_eq!(ff.audio_channel, 0);
        assert_eq!(ff.audio_sample, 1.0);
        assert_eq!(ff.detector_index, 7);
        assert_eq!(ff.detector_type, 5);
        assert_eq!(
            ff.payload,
            FeaturePayload::Tier0 {
                level_0_int8_0: 0x11,
                level_0_int8_1: 0x22,
                level_0_int8_2: 0x33,
                level_0_int8_3: 0x44,
            }
        );
    }

    #[test]
    fn tier3_feature_flattens() {
        let feature = [0x35, 0xff, 0x09, 0x00, 0x34, 0x12, 0x78, 0x56];
        let data = bytes_of(&[SENTINEL, CONFIG, MOMENT, TICK, feature, END]);
        let mut cursor = Cursor::new(data);
        let mut cb = Collector::default();

        parse_flat(&mut cursor, &mut cb);

        assert_eq!(cb.features.len(), 1);
        let ff = cb.features[0];
        assert_eq!(ff.detector_type, 0x35);
        assert_eq!(
            ff.payload,
            FeaturePayload::Tier3 { level_3_int16_0: 0x1234, level_3_int16_1: 0x5678 }
        );
    }

    #[test]
    fn feature_before_config_is_rejected() {
        let feature = [0x05, 0x00, 0x00, 0x00, 0, 0, 0, 0];
        let data = bytes_of(&[SENTINEL, MOMENT, TICK, feature, END]);
        let mut cursor = Cursor::new(data);
        let mut cb = Collector::default();

        parse_flat(&mut cursor, &mut cb);

        assert!(cb.features.is_empty());
        assert_eq!(cb.errors, vec![ValueErrorKind::ConfigMissing]);
    }

    #[test]
    fn feature_before_tick_is_rejected() {
        let feature = [0x05, 0x00, 0x00, 0x00, 0, 0, 0, 0];
        let data = bytes_of(&[SENTINEL, CONFIG, MOMENT, feature, END]);
        let mut cursor = Cursor::new(data);
        let mut cb = Collector::default();

        parse_flat(&mut cursor, &mut cb);

        assert!(cb.features.is_empty());
        assert_eq!(cb.errors, vec![ValueErrorKind::PrematureFeature]);
    }

    #[test]
    fn tick_before_moment_is_rejected() {
        let data = bytes_of(&[SENTINEL, CONFIG, TICK, END]);
        let mut cursor = Cursor::new(data);
        let mut cb = Collector::default();

        parse_flat(&mut cursor, &mut cb);

        assert_eq!(cb.errors, vec![ValueErrorKind::TickBeforeMoment]);
    }

    #[test]
    fn flat_config_emitted_once_both_halves_seen() {
        let config_feature = [0x51, 10, 0, 0, 20, 0, 5, 0];
        let data = bytes_of(&[SENTINEL, CONFIG, config_feature, END]);
        let mut cursor = Cursor::new(data);
        let mut cb = Collector::default();

        parse_flat(&mut cursor, &mut cb);

        assert_eq!(cb.configs.len(), 1);
        assert_eq!(cb.configs[0].max_abs_level_int8, 10);
        assert_eq!(cb.configs[0].audio_sample_rate, 8000);
    }

    #[test]
    fn each_feature_fires_flat_feature_exactly_once() {
        let f1 = [0x05, 0x00, 0x01, 0x00, 1, 2, 3, 4];
        let f2 = [0x21, 0x00, 0x02, 0x00, 5, 6, 7, 8];
        let data = bytes_of(&[SENTINEL, CONFIG, MOMENT, TICK, f1, f2, END]);
        let mut cursor = Cursor::new(data);
        let mut cb = Collector::default();

        parse_flat(&mut cursor, &mut cb);

        assert_eq!(cb.features.len(), 2);
        assert_eq!(cb.features[0].detector_index, 1);
        assert_eq!(cb.features[1].detector_index, 2);
    }
}
