use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use structopt::StructOpt;

use gnss_track_core::{
    ca_code_table, track, ChannelSeed, SliceSampleStream, TrackConfig,
};

#[derive(StructOpt)]
#[structopt(
    name = "track-demo",
    about = "tracks a synthesized stationary GPS L1 C/A tone"
)]
struct Options {
    #[structopt(long, default_value = "1", help = "comma-separated PRNs to track")]
    prns: String,
    #[structopt(long, default_value = "1000", help = "milliseconds to track")]
    duration_ms: usize,
    #[structopt(long, default_value = "4000000", help = "sampling frequency, Hz")]
    sampling_freq: f64,
    #[structopt(long, default_value = "0", help = "intermediate frequency, Hz")]
    intermediate_freq: f64,
    #[structopt(long, default_value = "250", help = "synthetic Doppler offset, Hz")]
    doppler: f64,
    #[structopt(long, help = "use the carrier-aided, two-stage loop filter")]
    aided: bool,
    #[structopt(long, short = "v")]
    verbose: bool,
}

/// Synthesizes `n_samples` of a C/A-modulated carrier at
/// `IF + doppler` for `prn`, with no navigation data modulation.
fn synth_tone(prn: u8, fs: f64, if_hz: f64, doppler: f64, n_samples: usize) -> Vec<f64> {
    let padded = ca_code_table().get(prn);
    let chip_rate = gnss_track_core::constants::CHIP_RATE;
    let mut out = Vec::with_capacity(n_samples);
    for n in 0..n_samples {
        let t = n as f64 / fs;
        let chip_idx = ((chip_rate * t) as usize) % 1023;
        let code = padded[chip_idx + 1];
        let carrier = (2.0 * gnss_track_core::constants::PI * (if_hz + doppler) * t).cos();
        out.push(code * carrier);
    }
    out
}

fn main() {
    env_logger::init();
    let opt = Options::from_args();

    let prns: Vec<u8> = opt
        .prns
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().expect("PRN must be a small integer"))
        .collect();

    println!(
        "{} {} prn(s) for {} at {}",
        "track-demo:".green().bold(),
        prns.len(),
        format!("{} ms", opt.duration_ms).bold(),
        format!("{:.3} MHz", opt.sampling_freq / 1e6).bold(),
    );

    let safety_samples =
        ((opt.duration_ms + gnss_track_core::constants::SAFETY_MARGIN_MS + 5) as f64
            * opt.sampling_freq
            / 1000.0) as usize;

    let mut samples = Vec::with_capacity(safety_samples);
    for (i, &prn) in prns.iter().enumerate() {
        let tone = synth_tone(prn, opt.sampling_freq, opt.intermediate_freq, opt.doppler, safety_samples);
        if i == 0 {
            samples = tone;
        } else {
            for (dst, src) in samples.iter_mut().zip(tone.iter()) {
                *dst += src;
            }
        }
    }
    let stream = SliceSampleStream::new(samples, opt.sampling_freq);

    let mut config = if opt.aided {
        TrackConfig::aided_two_stage_default()
    } else {
        TrackConfig::simple_default()
    };
    config.sampling_freq = opt.sampling_freq;
    config.intermediate_freq = opt.intermediate_freq;
    config.ms_to_track = Some(opt.duration_ms);
    config.show_progress = opt.verbose;

    let seeds: Vec<ChannelSeed> = prns
        .iter()
        .map(|&prn| ChannelSeed {
            prn,
            code_phase: 0.0,
            carr_freq: opt.intermediate_freq + opt.doppler * 0.9,
            snr: 10.0,
        })
        .collect();

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_handler = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_handler.store(true, Ordering::SeqCst);
    })
    .expect("failed to install Ctrl+C handler");

    let ts = Instant::now();
    let results = track(&seeds, &stream, &config, &cancel).expect("invalid tracking configuration");
    let elapsed = ts.elapsed();

    for result in &results {
        let status_label = match result.status {
            gnss_track_core::error::STATUS_TRACKED => "TRACKED".green(),
            gnss_track_core::error::STATUS_CANCELLED => "CANCELLED".yellow(),
            _ => "RUNNING".normal(),
        };
        println!(
            "prn {:>2}: {} steps={:<5} carr_freq={:>9.2} Hz  cn0={:>5.1} dB-Hz  [{}]",
            result.prn,
            status_label,
            result.len(),
            result.carr_freq.last().copied().unwrap_or(0.0),
            result.cn0.last().copied().unwrap_or(0.0),
            if result.status == gnss_track_core::error::STATUS_TRACKED {
                "ok"
            } else {
                "stopped early"
            },
        );
    }
    println!("duration: {} ms", elapsed.as_millis());
}
