use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use log::{debug, info};
use rustfft::num_complex::Complex64;

use crate::ca_code::ca_code_table;
use crate::channel_seed::ChannelSeed;
use crate::cn0::CN0Estimator;
use crate::config::{LoopFilterClass, TrackConfig};
use crate::error::{STATUS_CANCELLED, STATUS_TRACKED};
use crate::loop_filter::LoopFilter;
use crate::bit_sync::BitSync;
use crate::nav_msg::NavMsgDecoder;
use crate::sample_stream::SampleStream;
use crate::track_result::TrackResult;

/// Drives one channel's closed tracking loop to completion.
///
/// Owns all per-channel mutable NCO/loop-filter/bit-sync state; a single
/// call to [`ChannelDriver::run`] consumes it and returns the finished
/// [`TrackResult`]. Grounded on the teacher's `Channel` struct, which
/// similarly owns its loop state across repeated per-step calls.
pub struct ChannelDriver {
    prn: u8,
    ca_code: Vec<f64>,
    loop_filter: LoopFilter,
    bit_sync: BitSync,
    cn0_est: CN0Estimator,
    code_phase: f64,
    carr_phase: f64,
    code_phase_acc: f64,
    carr_phase_acc: f64,
    sample_index: usize,
    stage1: bool,
}

impl ChannelDriver {
    /// Builds a driver from a post-acquisition seed and the shared
    /// tracking configuration.
    pub fn new(seed: &ChannelSeed, config: &TrackConfig) -> Self {
        let ca_code = ca_code_table().get(seed.prn);

        let mut loop_filter = match config.loop_filter_class {
            LoopFilterClass::Simple => LoopFilter::new_simple(&config.stage1_loop_filter_params),
            LoopFilterClass::Aided => LoopFilter::new_aided(&config.stage1_loop_filter_params),
        };
        // Initial excess code rate is zero by design; see the Open
        // Question resolution in DESIGN.md.
        loop_filter.start(0.0, seed.carr_freq - config.intermediate_freq);

        let bit_sync = config.bit_sync.build();

        let cn0_0 = 10.0 * seed.snr.log10() + 10.0 * 1000f64.log10();
        let loop_freq = config.stage1_loop_filter_params.loop_freq;
        let cn0_est = CN0Estimator::new(loop_freq, cn0_0, 10.0, loop_freq);

        let sample_index =
            (seed.code_phase * (config.sampling_freq / config.chipping_rate).round()) as usize;

        Self {
            prn: seed.prn,
            ca_code,
            loop_filter,
            bit_sync,
            cn0_est,
            code_phase: 0.0,
            carr_phase: 0.0,
            code_phase_acc: 0.0,
            carr_phase_acc: 0.0,
            sample_index,
            stage1: true,
        }
    }

    /// Runs the closed loop until `ms_to_track` milliseconds have been
    /// integrated, the sample stream is exhausted, or `cancel` is
    /// observed set. `nav_msg` is consumed opaquely: only its TOW and
    /// bit-phase-reference outputs are used.
    pub fn run(
        mut self,
        samples: &dyn SampleStream,
        config: &TrackConfig,
        nav_msg: &mut dyn NavMsgDecoder,
        cancel: &AtomicBool,
        ms_to_track: usize,
    ) -> TrackResult {
        let mut result = TrackResult::with_capacity(self.prn, ms_to_track);
        let mut ms_tracked = 0usize;

        while ms_tracked < ms_to_track {
            if cancel.load(Ordering::SeqCst) {
                result.status = STATUS_CANCELLED;
                debug!("prn {}: {}", self.prn, "tracking cancelled".yellow());
                return result;
            }

            if self.stage1 {
                if let (Some(stage2_ms), Some(stage2_params)) = (
                    config.stage2_coherent_ms,
                    config.stage2_loop_filter_params.as_ref(),
                ) {
                    if self.bit_sync.synced()
                        && self.bit_sync.bit_phase() == self.bit_sync.bit_phase_ref() as usize
                    {
                        self.stage1 = false;
                        self.loop_filter.retune(stage2_params);
                        let prev_cn0 = result.cn0.last().copied().unwrap_or(self.cn0_est.cn0());
                        let new_loop_freq = 1e3 / stage2_ms as f64;
                        self.cn0_est = CN0Estimator::new(new_loop_freq, prev_cn0, 10.0, new_loop_freq);
                        info!(
                            "prn {}: {}",
                            self.prn,
                            format!("stage-2 handover at {new_loop_freq:.1} Hz").green()
                        );
                    }
                }
            }

            let coherent_ms = if self.stage1 {
                1
            } else {
                config.stage2_coherent_ms.unwrap()
            };

            let mut e = Complex64::default();
            let mut p = Complex64::default();
            let mut l = Complex64::default();
            let mut exhausted = false;

            for _ in 0..coherent_ms {
                let f_code = self.loop_filter.code_freq() + config.chipping_rate;
                let f_carr = self.loop_filter.carr_freq() + config.intermediate_freq;

                let remaining = samples.len().saturating_sub(self.sample_index);
                let tail = match samples.samples_from(self.sample_index, remaining) {
                    Some(t) => t,
                    None => {
                        exhausted = true;
                        break;
                    }
                };

                let out = match config.correlator.correlate(
                    tail,
                    f_code,
                    self.code_phase,
                    f_carr,
                    self.carr_phase,
                    &self.ca_code,
                    config.sampling_freq,
                    self.prn,
                ) {
                    Ok(out) => out,
                    Err(_) => {
                        exhausted = true;
                        break;
                    }
                };

                self.sample_index += out.blksize;
                self.code_phase = out.code_phase_out;
                self.carr_phase = out.carr_phase_out;
                self.carr_phase_acc +=
                    self.loop_filter.carr_freq() * out.blksize as f64 / config.sampling_freq;
                self.code_phase_acc +=
                    self.loop_filter.code_freq() * out.blksize as f64 / config.sampling_freq;

                e += out.e;
                p += out.p;
                l += out.l;
            }

            if exhausted {
                result.status = STATUS_TRACKED;
                debug!("prn {}: {}", self.prn, "stream exhausted".yellow());
                return result;
            }

            self.loop_filter.update(e, p, l);
            self.bit_sync.update(p.re, coherent_ms);

            let fresh_tow = nav_msg.update(p.re, coherent_ms);
            self.bit_sync.adopt_external_bit_phase_ref(nav_msg.bit_phase_ref());
            let tow = fresh_tow.or_else(|| {
                result
                    .tow
                    .last()
                    .copied()
                    .flatten()
                    .map(|t| t + coherent_ms as u32)
            });

            let cn0 = self.cn0_est.update(p.re, p.im);

            result.absolute_sample.push(self.sample_index);
            result.code_phase.push(self.code_phase);
            result.code_phase_acc.push(self.code_phase_acc);
            result
                .code_freq
                .push(self.loop_filter.code_freq() + config.chipping_rate);
            result.carr_phase.push(self.carr_phase);
            result.carr_phase_acc.push(self.carr_phase_acc);
            result
                .carr_freq
                .push(self.loop_filter.carr_freq() + config.intermediate_freq);
            result.e.push(e);
            result.p.push(p);
            result.l.push(l);
            result.cn0.push(cn0);
            result.tow.push(tow);
            result.coherent_ms.push(coherent_ms);
            result.nav_msg_bit_phase_ref.push(self.bit_sync.bit_phase_ref());

            ms_tracked += coherent_ms;
        }

        result.status = STATUS_TRACKED;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_seed::ChannelSeed;
    use crate::config::TrackConfig;
    use crate::nav_msg::NullNavMsg;
    use crate::sample_stream::SliceSampleStream;

    /// Synthesizes a C/A-modulated, optionally Doppler-shifted and
    /// bit-flipped baseband signal for one PRN.
    fn synth_signal(
        prn: u8,
        fs: f64,
        chip_rate: f64,
        if_hz: f64,
        carr_offset: f64,
        n_samples: usize,
        bit_period_ms: Option<usize>,
    ) -> Vec<f64> {
        let padded = ca_code_table().get(prn);
        let mut out = Vec::with_capacity(n_samples);
        for n in 0..n_samples {
            let t = n as f64 / fs;
            let chip_idx = ((chip_rate * t) as usize) % 1023;
            let code = padded[chip_idx + 1];
            let bit = match bit_period_ms {
                Some(period) => {
                    let ms = (t * 1000.0) as usize;
                    if (ms / period) % 2 == 0 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                None => 1.0,
            };
            let carrier = (2.0 * crate::constants::PI * (if_hz + carr_offset) * t).cos();
            out.push(bit * code * carrier);
        }
        out
    }

    #[test]
    fn carrier_tracks_toward_true_doppler() {
        let prn = 1u8;
        let fs = 4e6;
        let n_samples = (0.2 * fs) as usize; // 200 ms
        let samples = synth_signal(prn, fs, crate::constants::CHIP_RATE, 0.0, 100.0, n_samples, None);
        let stream = SliceSampleStream::new(samples, fs);

        let mut config = TrackConfig::simple_default();
        config.sampling_freq = fs;
        config.intermediate_freq = 0.0;

        let seed = ChannelSeed {
            prn,
            code_phase: 0.0,
            carr_freq: 90.0,
            snr: 10.0,
        };

        let driver = ChannelDriver::new(&seed, &config);
        let cancel = AtomicBool::new(false);
        let mut nav_msg = NullNavMsg;
        let result = driver.run(&stream, &config, &mut nav_msg, &cancel, 150);

        assert!(!result.is_empty());
        let final_carr = *result.carr_freq.last().unwrap();
        assert!(
            (final_carr - 100.0).abs() < (90.0f64 - 100.0).abs(),
            "carrier estimate {final_carr} did not move toward the true 100 Hz offset"
        );
        for &cp in &result.code_phase {
            assert!((0.0..1.0).contains(&cp));
        }
        for &cp in &result.carr_phase {
            assert!((0.0..1.0).contains(&cp));
        }
        for pair in result.absolute_sample.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn two_stage_handover_switches_coherent_ms() {
        let prn = 2u8;
        let fs = 4e6;
        let n_samples = (0.5 * fs) as usize;
        let samples = synth_signal(
            prn,
            fs,
            crate::constants::CHIP_RATE,
            0.0,
            0.0,
            n_samples,
            Some(20),
        );
        let stream = SliceSampleStream::new(samples, fs);

        let mut config = TrackConfig::aided_two_stage_default();
        config.sampling_freq = fs;
        config.intermediate_freq = 0.0;
        config.bit_sync = crate::bit_sync::BitSyncVariant::MatchBit { thres: 2.0 };

        let seed = ChannelSeed {
            prn,
            code_phase: 0.0,
            carr_freq: 0.0,
            snr: 10.0,
        };

        let driver = ChannelDriver::new(&seed, &config);
        let cancel = AtomicBool::new(false);
        let mut nav_msg = NullNavMsg;
        let result = driver.run(&stream, &config, &mut nav_msg, &cancel, 400);

        assert!(result.coherent_ms.iter().any(|&ms| ms == 5));
        // once stage-2 begins every remaining step is 5 ms.
        let first5 = result.coherent_ms.iter().position(|&ms| ms == 5);
        if let Some(idx) = first5 {
            assert!(result.coherent_ms[idx..].iter().all(|&ms| ms == 5));
        }
    }

    #[test]
    fn short_stream_clamps_to_available_samples() {
        let prn = 3u8;
        let fs = 4e6;
        let n_samples = (0.1 * fs) as usize; // ~100 ms of data
        let samples = synth_signal(prn, fs, crate::constants::CHIP_RATE, 0.0, 0.0, n_samples, None);
        let stream = SliceSampleStream::new(samples, fs);

        let config = TrackConfig::simple_default();
        let seed = ChannelSeed {
            prn,
            code_phase: 0.0,
            carr_freq: 0.0,
            snr: 10.0,
        };

        let driver = ChannelDriver::new(&seed, &config);
        let cancel = AtomicBool::new(false);
        let mut nav_msg = NullNavMsg;
        let result = driver.run(&stream, &config, &mut nav_msg, &cancel, 1000);

        assert_eq!(result.status, crate::error::STATUS_TRACKED);
        assert!(result.len() < 1000);
        assert!(result.len() > 50);
    }

    #[test]
    fn cancellation_truncates_result() {
        let prn = 4u8;
        let fs = 4e6;
        let n_samples = (0.5 * fs) as usize;
        let samples = synth_signal(prn, fs, crate::constants::CHIP_RATE, 0.0, 0.0, n_samples, None);
        let stream = SliceSampleStream::new(samples, fs);

        let config = TrackConfig::simple_default();
        let seed = ChannelSeed {
            prn,
            code_phase: 0.0,
            carr_freq: 0.0,
            snr: 10.0,
        };

        let driver = ChannelDriver::new(&seed, &config);
        let cancel = AtomicBool::new(true);
        let mut nav_msg = NullNavMsg;
        let result = driver.run(&stream, &config, &mut nav_msg, &cancel, 400);

        assert_eq!(result.status, crate::error::STATUS_CANCELLED);
        assert_eq!(result.len(), 0);
    }
}
