/// Post-acquisition seed handed to the driver for one channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelSeed {
    /// PRN index, 1..=32.
    pub prn: u8,
    /// Initial code phase, in chips.
    pub code_phase: f64,
    /// Initial carrier frequency, in Hz, including IF.
    pub carr_freq: f64,
    /// Acquisition SNR (linear, not dB).
    pub snr: f64,
}
