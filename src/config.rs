use crate::bit_sync::BitSyncVariant;
use crate::correlator::Correlator;
use crate::correlator::DefaultCorrelator;
use crate::error::TrackingError;

/// Reified form of the positional `(NBW, zeta, k)` tuples the loop
/// filter constructors take, plus the aiding parameters used only by
/// [`crate::loop_filter::LoopFilter::Aided`].
#[derive(Debug, Clone, Copy)]
pub struct LoopFilterParams {
    pub code_bw: f64,
    pub code_zeta: f64,
    pub code_k: f64,
    pub carr_bw: f64,
    pub carr_zeta: f64,
    pub carr_k: f64,
    pub loop_freq: f64,
    pub carr_aiding_igain: Option<f64>,
    pub carr_to_code_ratio: Option<f64>,
}

impl LoopFilterParams {
    pub fn validate(&self) -> Result<(), TrackingError> {
        if self.code_bw <= 0.0 || self.carr_bw <= 0.0 {
            return Err(TrackingError::InvalidParams(
                "loop filter noise bandwidth must be positive".into(),
            ));
        }
        if self.code_zeta <= 0.0 || self.carr_zeta <= 0.0 {
            return Err(TrackingError::InvalidParams(
                "loop filter damping must be positive".into(),
            ));
        }
        if self.loop_freq <= 0.0 {
            return Err(TrackingError::InvalidParams(
                "loop filter frequency must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Selects which [`crate::loop_filter::LoopFilter`] variant a channel is
/// built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFilterClass {
    Simple,
    Aided,
}

/// Full configuration surface for [`crate::dispatch::track`], mirroring
/// the Options table in the specification.
pub struct TrackConfig {
    pub ms_to_track: Option<usize>,
    pub sampling_freq: f64,
    pub chipping_rate: f64,
    pub intermediate_freq: f64,
    pub loop_filter_class: LoopFilterClass,
    pub stage1_loop_filter_params: LoopFilterParams,
    pub stage2_coherent_ms: Option<usize>,
    pub stage2_loop_filter_params: Option<LoopFilterParams>,
    pub bit_sync: BitSyncVariant,
    pub correlator: Box<dyn Correlator>,
    pub multi: bool,
    pub show_progress: bool,
}

impl TrackConfig {
    /// A configuration close to the original spec's `default_loop_filter`
    /// / single-stage tracking, useful for tests and the demo binary.
    pub fn simple_default() -> Self {
        Self {
            ms_to_track: None,
            sampling_freq: crate::constants::DEFAULT_SAMPLING_FREQ,
            chipping_rate: crate::constants::CHIP_RATE,
            intermediate_freq: crate::constants::DEFAULT_IF,
            loop_filter_class: LoopFilterClass::Simple,
            stage1_loop_filter_params: LoopFilterParams {
                code_bw: 2.0,
                code_zeta: 0.7,
                code_k: 1.0,
                carr_bw: 25.0,
                carr_zeta: 0.7,
                carr_k: 0.25,
                loop_freq: 1e3,
                carr_aiding_igain: None,
                carr_to_code_ratio: None,
            },
            stage2_coherent_ms: None,
            stage2_loop_filter_params: None,
            bit_sync: BitSyncVariant::MatchBit { thres: 20.0 },
            correlator: Box::new(DefaultCorrelator),
            multi: true,
            show_progress: false,
        }
    }

    /// The original spec's `aided_loop_filter` default, with a 5 ms
    /// stage-2 handover.
    pub fn aided_two_stage_default() -> Self {
        Self {
            loop_filter_class: LoopFilterClass::Aided,
            stage1_loop_filter_params: LoopFilterParams {
                code_bw: 1.0,
                code_zeta: 0.7,
                code_k: 1.0,
                carr_bw: 25.0,
                carr_zeta: 0.7,
                carr_k: 1.0,
                loop_freq: 1e3,
                carr_aiding_igain: Some(5.0),
                carr_to_code_ratio: Some(crate::constants::CARRIER_TO_CODE_RATIO),
            },
            stage2_coherent_ms: Some(5),
            stage2_loop_filter_params: Some(LoopFilterParams {
                code_bw: 0.5,
                code_zeta: 0.7,
                code_k: 1.0,
                carr_bw: 10.0,
                carr_zeta: 0.7,
                carr_k: 1.0,
                loop_freq: 1e3 / 5.0,
                carr_aiding_igain: Some(5.0),
                carr_to_code_ratio: Some(crate::constants::CARRIER_TO_CODE_RATIO),
            }),
            ..Self::simple_default()
        }
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        self.stage1_loop_filter_params.validate()?;

        if let Some(ms) = self.stage2_coherent_ms {
            if ms < 2 {
                return Err(TrackingError::InvalidParams(
                    "stage2_coherent_ms must be >= 2 when set".into(),
                ));
            }
            match &self.stage2_loop_filter_params {
                Some(p) => p.validate()?,
                None => {
                    return Err(TrackingError::InvalidParams(
                        "stage2_coherent_ms set without stage2_loop_filter_params".into(),
                    ));
                }
            }
        }

        if self.sampling_freq <= 0.0 || self.chipping_rate <= 0.0 {
            return Err(TrackingError::InvalidParams(
                "sampling_freq and chipping_rate must be positive".into(),
            ));
        }

        Ok(())
    }
}
