use rustfft::num_complex::Complex64;

use crate::config::LoopFilterParams;
use crate::constants::PRN_CODE_LEN;

const EPSILON: f64 = 1e-12;

/// Early-minus-late normalised code discriminator, in chips.
fn discriminate_code(e: Complex64, l: Complex64) -> f64 {
    let en = e.norm();
    let ln = l.norm();
    if en + ln < EPSILON {
        return 0.0;
    }
    (en - ln) / (en + ln)
}

/// Costas (arctan) carrier phase discriminator, in cycles.
fn discriminate_carrier(p: Complex64) -> f64 {
    p.im.atan2(p.re) / (2.0 * crate::constants::PI)
}

/// Bilinear-transform coefficients for a 2nd-order loop filter of noise
/// bandwidth `bw`, damping `zeta` and gain `k`.
fn calc_loop_coef(bw: f64, zeta: f64, k: f64) -> (f64, f64) {
    let wn = bw * 8.0 * zeta / (4.0 * zeta * zeta + 1.0);
    let tau1 = k / (wn * wn);
    let tau2 = 2.0 * zeta / wn;
    (tau1, tau2)
}

#[derive(Debug, Clone, Copy, Default)]
struct SecondOrderFilter {
    tau1: f64,
    tau2: f64,
    period: f64,
    prev_err: f64,
}

impl SecondOrderFilter {
    fn new(bw: f64, zeta: f64, k: f64, period: f64) -> Self {
        let (tau1, tau2) = calc_loop_coef(bw, zeta, k);
        Self {
            tau1,
            tau2,
            period,
            prev_err: 0.0,
        }
    }

    fn retune(&mut self, bw: f64, zeta: f64, k: f64, period: f64) {
        let (tau1, tau2) = calc_loop_coef(bw, zeta, k);
        self.tau1 = tau1;
        self.tau2 = tau2;
        self.period = period;
    }

    /// Applies the discriminator error and returns the NCO frequency
    /// delta to apply.
    fn step(&mut self, err: f64) -> f64 {
        let delta =
            (self.tau2 / self.tau1) * (err - self.prev_err) + err * (self.period / self.tau1);
        self.prev_err = err;
        delta
    }
}

/// A closed-loop carrier/code tracking filter.
///
/// Both variants expose the same capability set (`start`, `update`,
/// `retune`, `code_freq`, `carr_freq`); `Aided` additionally couples the
/// carrier loop's frequency estimate into the code NCO.
pub enum LoopFilter {
    Simple {
        code: SecondOrderFilter,
        carr: SecondOrderFilter,
        code_freq: f64,
        carr_freq: f64,
    },
    Aided {
        code: SecondOrderFilter,
        carr: SecondOrderFilter,
        code_freq: f64,
        carr_freq: f64,
        aiding_igain: f64,
        carr_to_code_ratio: f64,
    },
}

impl LoopFilter {
    pub fn new_simple(params: &LoopFilterParams) -> Self {
        LoopFilter::Simple {
            code: SecondOrderFilter::new(
                params.code_bw,
                params.code_zeta,
                params.code_k,
                1.0 / params.loop_freq,
            ),
            carr: SecondOrderFilter::new(
                params.carr_bw,
                params.carr_zeta,
                params.carr_k,
                1.0 / params.loop_freq,
            ),
            code_freq: 0.0,
            carr_freq: 0.0,
        }
    }

    pub fn new_aided(params: &LoopFilterParams) -> Self {
        LoopFilter::Aided {
            code: SecondOrderFilter::new(
                params.code_bw,
                params.code_zeta,
                params.code_k,
                1.0 / params.loop_freq,
            ),
            carr: SecondOrderFilter::new(
                params.carr_bw,
                params.carr_zeta,
                params.carr_k,
                1.0 / params.loop_freq,
            ),
            code_freq: 0.0,
            carr_freq: 0.0,
            aiding_igain: params.carr_aiding_igain.unwrap_or(0.0),
            carr_to_code_ratio: params
                .carr_to_code_ratio
                .unwrap_or(crate::constants::CARRIER_TO_CODE_RATIO),
        }
    }

    pub fn code_freq(&self) -> f64 {
        match self {
            LoopFilter::Simple { code_freq, .. } => *code_freq,
            LoopFilter::Aided { code_freq, .. } => *code_freq,
        }
    }

    pub fn carr_freq(&self) -> f64 {
        match self {
            LoopFilter::Simple { carr_freq, .. } => *carr_freq,
            LoopFilter::Aided { carr_freq, .. } => *carr_freq,
        }
    }

    /// (Re-)initialises the NCO commands. Filter coefficients and
    /// discriminator state are left untouched (matching the original
    /// spec's `start` contract).
    pub fn start(&mut self, code_freq: f64, carr_freq: f64) {
        match self {
            LoopFilter::Simple {
                code_freq: cf,
                carr_freq: kf,
                ..
            } => {
                *cf = code_freq;
                *kf = carr_freq;
            }
            LoopFilter::Aided {
                code_freq: cf,
                carr_freq: kf,
                ..
            } => {
                *cf = code_freq;
                *kf = carr_freq;
            }
        }
    }

    /// Replaces the filter coefficients without resetting the NCO
    /// states, used for the stage-1 -> stage-2 handover.
    pub fn retune(&mut self, params: &LoopFilterParams) {
        let period = 1.0 / params.loop_freq;
        match self {
            LoopFilter::Simple { code, carr, .. } => {
                code.retune(params.code_bw, params.code_zeta, params.code_k, period);
                carr.retune(params.carr_bw, params.carr_zeta, params.carr_k, period);
            }
            LoopFilter::Aided {
                code,
                carr,
                aiding_igain,
                carr_to_code_ratio,
                ..
            } => {
                code.retune(params.code_bw, params.code_zeta, params.code_k, period);
                carr.retune(params.carr_bw, params.carr_zeta, params.carr_k, period);
                *aiding_igain = params.carr_aiding_igain.unwrap_or(*aiding_igain);
                *carr_to_code_ratio = params
                    .carr_to_code_ratio
                    .unwrap_or(*carr_to_code_ratio);
            }
        }
    }

    /// Consumes one coherent E/P/L sum and updates `code_freq`/
    /// `carr_freq` for the next correlator call.
    pub fn update(&mut self, e: Complex64, p: Complex64, l: Complex64) {
        let d_code = discriminate_code(e, l) / PRN_CODE_LEN as f64;
        let d_carr = discriminate_carrier(p);

        match self {
            LoopFilter::Simple {
                code,
                carr,
                code_freq,
                carr_freq,
            } => {
                *code_freq += code.step(d_code);
                *carr_freq += carr.step(d_carr);
            }
            LoopFilter::Aided {
                code,
                carr,
                code_freq,
                carr_freq,
                aiding_igain,
                carr_to_code_ratio,
            } => {
                *carr_freq += carr.step(d_carr);
                let aiding = *aiding_igain * *carr_freq / *carr_to_code_ratio;
                *code_freq += code.step(d_code) + aiding * code.period;
            }
        }
    }
}
