use rustfft::num_complex::Complex64;

use crate::constants::PRN_CODE_LEN;
use crate::error::TrackingError;

/// Half-chip spacing between the early/prompt/late correlator arms.
const SP_CORR: f64 = 0.5;

/// Result of one correlator invocation: early/prompt/late complex sums
/// plus the NCO state to carry into the next call.
pub struct CorrelatorOutput {
    pub e: Complex64,
    pub p: Complex64,
    pub l: Complex64,
    pub blksize: usize,
    pub code_phase_out: f64,
    pub carr_phase_out: f64,
}

/// Pluggable per-sample mix-and-integrate correlator.
///
/// A call spans exactly one C/A epoch (1023 chips) at the current total
/// code rate. Implementations must fail with
/// [`TrackingError::StreamExhausted`] when `samples_tail` is shorter than
/// the block the epoch requires.
pub trait Correlator: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn correlate(
        &self,
        samples_tail: &[f64],
        f_code: f64,
        code_phase_in: f64,
        f_carr: f64,
        carr_phase_in: f64,
        ca_code: &[f64],
        f_s: f64,
        prn: u8,
    ) -> Result<CorrelatorOutput, TrackingError>;
}

/// Returns the padded-array value for a real-valued chip offset, using
/// truncation toward negative infinity and modulo-1023 wraparound.
///
/// `ca_code` is expected in the padded layout produced by
/// [`crate::ca_code::CaCodeTable::get`]: `ca_code[1 + (r % 1023)]` holds
/// the chip at logical index `r`.
fn chip_at(ca_code: &[f64], chip_offset: f64) -> f64 {
    let floor_idx = chip_offset.floor() as i64;
    let r = floor_idx.rem_euclid(PRN_CODE_LEN as i64);
    ca_code[(r + 1) as usize]
}

/// Default resampling correlator: per-sample carrier mix against a
/// locally generated C/A code, early/prompt/late arms separated by a
/// half chip.
#[derive(Default)]
pub struct DefaultCorrelator;

impl Correlator for DefaultCorrelator {
    fn correlate(
        &self,
        samples_tail: &[f64],
        f_code: f64,
        code_phase_in: f64,
        f_carr: f64,
        carr_phase_in: f64,
        ca_code: &[f64],
        f_s: f64,
        prn: u8,
    ) -> Result<CorrelatorOutput, TrackingError> {
        let blksize =
            ((PRN_CODE_LEN as f64 - code_phase_in) * f_s / f_code).ceil() as usize;
        let blksize = blksize.max(1);

        if samples_tail.len() < blksize {
            return Err(TrackingError::StreamExhausted { prn });
        }

        let mut e = Complex64::default();
        let mut p = Complex64::default();
        let mut l = Complex64::default();

        for n in 0..blksize {
            let s = samples_tail[n];
            let phi_c = carr_phase_in + f_carr * n as f64 / f_s;
            let carrier = Complex64::new(0.0, -2.0 * crate::constants::PI * phi_c).exp();
            let mixed = s * carrier;

            let tau = code_phase_in + f_code * n as f64 / f_s;

            p += mixed * chip_at(ca_code, tau);
            e += mixed * chip_at(ca_code, tau + SP_CORR);
            l += mixed * chip_at(ca_code, tau - SP_CORR);
        }

        let code_phase_raw = code_phase_in + f_code * blksize as f64 / f_s;
        let code_phase_out = code_phase_raw
            .rem_euclid(PRN_CODE_LEN as f64)
            .rem_euclid(1.0);

        let carr_phase_raw = carr_phase_in + f_carr * blksize as f64 / f_s;
        let carr_phase_out = carr_phase_raw.rem_euclid(1.0);

        Ok(CorrelatorOutput {
            e,
            p,
            l,
            blksize,
            code_phase_out,
            carr_phase_out,
        })
    }
}
