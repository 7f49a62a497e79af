pub const PI: f64 = std::f64::consts::PI;

/// Length of the C/A (Gold) code, in chips.
pub const PRN_CODE_LEN: usize = 1023;

/// Nominal GPS L1 C/A chipping rate, in chips/sec.
pub const CHIP_RATE: f64 = 1.023e6;

/// GPS L1 carrier frequency, in Hz.
pub const L1: f64 = 1.57542e9;

/// Carrier-to-code frequency ratio used by carrier-aided code tracking.
pub const CARRIER_TO_CODE_RATIO: f64 = 1540.0;

/// Length of a nav bit, in ms.
pub const NAV_BIT_MS: usize = 20;

/// Default intermediate frequency assumed when a caller doesn't override it.
pub const DEFAULT_IF: f64 = 0.0;

/// Default sampling frequency assumed when a caller doesn't override it.
pub const DEFAULT_SAMPLING_FREQ: f64 = 16.368e6;

/// Safety margin (ms) the correlator may run past the requested tracking length.
pub const SAFETY_MARGIN_MS: usize = 22;
