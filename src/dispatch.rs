use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::info;
use rayon::prelude::*;

use crate::channel_seed::ChannelSeed;
use crate::config::TrackConfig;
use crate::constants::SAFETY_MARGIN_MS;
use crate::driver::ChannelDriver;
use crate::error::TrackingError;
use crate::nav_msg::NullNavMsg;
use crate::sample_stream::SampleStream;
use crate::track_result::TrackResult;

/// Runs the two-stage tracking loop for every channel seed against
/// `samples`, fanning out across a rayon thread pool when
/// `config.multi` is set.
///
/// Validates `config` once before any channel starts (fatal,
/// per [`TrackConfig::validate`]); per-channel failures
/// (`StreamExhausted`, `Cancelled`) are absorbed into that channel's
/// `TrackResult.status` rather than propagated, so one channel's
/// failure never drops its siblings.
///
/// `cancel` is checked cooperatively by every channel at least once per
/// step; set it from outside (e.g. a `ctrlc` handler) to stop all
/// channels early. Returns results in the same order as `seeds`
/// regardless of which channel finished first.
pub fn track(
    seeds: &[ChannelSeed],
    samples: &dyn SampleStream,
    config: &TrackConfig,
    cancel: &AtomicBool,
) -> Result<Vec<TrackResult>, TrackingError> {
    config.validate()?;

    let max_ms = ((samples.len() as f64 / samples.sampling_freq()) * 1000.0) as usize;
    let max_ms = max_ms.saturating_sub(SAFETY_MARGIN_MS);
    let ms_to_track = config
        .ms_to_track
        .map(|requested| requested.min(max_ms))
        .unwrap_or(max_ms);

    let progress = AtomicUsize::new(0);
    let total = seeds.len();

    let run_one = |seed: &ChannelSeed| -> TrackResult {
        let driver = ChannelDriver::new(seed, config);
        let mut nav_msg = NullNavMsg;
        let result = driver.run(samples, config, &mut nav_msg, cancel, ms_to_track);

        if config.show_progress {
            let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
            info!("tracking progress: {done}/{total} channels complete");
        }

        result
    };

    let results = if config.multi {
        seeds.par_iter().map(run_one).collect()
    } else {
        seeds.iter().map(run_one).collect()
    };

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_stream::SliceSampleStream;

    fn flat_seeds(prns: &[u8]) -> Vec<ChannelSeed> {
        prns.iter()
            .map(|&prn| ChannelSeed {
                prn,
                code_phase: 0.0,
                carr_freq: 0.0,
                snr: 10.0,
            })
            .collect()
    }

    #[test]
    fn returns_results_in_input_channel_order() {
        let fs = 4e6;
        let samples = vec![0.1f64; (0.2 * fs) as usize];
        let stream = SliceSampleStream::new(samples, fs);
        let mut config = TrackConfig::simple_default();
        config.sampling_freq = fs;
        config.ms_to_track = Some(50);

        let seeds = flat_seeds(&[3, 1, 2]);
        let cancel = AtomicBool::new(false);

        let results = track(&seeds, &stream, &config, &cancel).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].prn, 3);
        assert_eq!(results[1].prn, 1);
        assert_eq!(results[2].prn, 2);
    }

    #[test]
    fn sequential_mode_matches_parallel_channel_count() {
        let fs = 4e6;
        let samples = vec![0.1f64; (0.2 * fs) as usize];
        let stream = SliceSampleStream::new(samples, fs);
        let mut config = TrackConfig::simple_default();
        config.sampling_freq = fs;
        config.ms_to_track = Some(50);
        config.multi = false;

        let seeds = flat_seeds(&[5, 6]);
        let cancel = AtomicBool::new(false);

        let results = track(&seeds, &stream, &config, &cancel).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn invalid_config_rejected_before_any_channel_runs() {
        let fs = 4e6;
        let samples = vec![0.1f64; (0.2 * fs) as usize];
        let stream = SliceSampleStream::new(samples, fs);
        let mut config = TrackConfig::simple_default();
        config.stage2_coherent_ms = Some(5);
        config.stage2_loop_filter_params = None;

        let seeds = flat_seeds(&[1]);
        let cancel = AtomicBool::new(false);

        let res = track(&seeds, &stream, &config, &cancel);
        assert!(matches!(res, Err(TrackingError::InvalidParams(_))));
    }

    #[test]
    fn ms_to_track_clamps_to_safety_margin() {
        let fs = 1000.0;
        // exactly 1 s of samples at 1 kHz.
        let samples = vec![0.1f64; 1000];
        let stream = SliceSampleStream::new(samples, fs);
        let mut config = TrackConfig::simple_default();
        config.sampling_freq = fs;
        config.ms_to_track = Some(100_000);

        let seeds = flat_seeds(&[1]);
        let cancel = AtomicBool::new(false);

        let results = track(&seeds, &stream, &config, &cancel).unwrap();
        assert!(results[0].len() <= 1000 - SAFETY_MARGIN_MS);
    }
}
