use rustfft::num_complex::Complex64;

use crate::error::STATUS_RUNNING;

/// Time-ordered, per-step tracking output for one channel.
///
/// Columnar on purpose (mirrors the original spec's `TrackResults`):
/// every field is a `Vec` indexed by step, preallocated to an upper
/// bound and truncated to the actual step count at termination.
pub struct TrackResult {
    pub prn: u8,
    pub status: u8,

    pub absolute_sample: Vec<usize>,
    pub code_phase: Vec<f64>,
    pub code_phase_acc: Vec<f64>,
    pub code_freq: Vec<f64>,
    pub carr_phase: Vec<f64>,
    pub carr_phase_acc: Vec<f64>,
    pub carr_freq: Vec<f64>,
    pub e: Vec<Complex64>,
    pub p: Vec<Complex64>,
    pub l: Vec<Complex64>,
    pub cn0: Vec<f64>,
    pub tow: Vec<Option<u32>>,
    pub coherent_ms: Vec<usize>,
    pub nav_msg_bit_phase_ref: Vec<i32>,
}

impl TrackResult {
    pub fn with_capacity(prn: u8, capacity: usize) -> Self {
        Self {
            prn,
            status: STATUS_RUNNING,
            absolute_sample: Vec::with_capacity(capacity),
            code_phase: Vec::with_capacity(capacity),
            code_phase_acc: Vec::with_capacity(capacity),
            code_freq: Vec::with_capacity(capacity),
            carr_phase: Vec::with_capacity(capacity),
            carr_phase_acc: Vec::with_capacity(capacity),
            carr_freq: Vec::with_capacity(capacity),
            e: Vec::with_capacity(capacity),
            p: Vec::with_capacity(capacity),
            l: Vec::with_capacity(capacity),
            cn0: Vec::with_capacity(capacity),
            tow: Vec::with_capacity(capacity),
            coherent_ms: Vec::with_capacity(capacity),
            nav_msg_bit_phase_ref: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.absolute_sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncates every series to `n` steps, used at channel termination.
    pub fn truncate(&mut self, n: usize) {
        self.absolute_sample.truncate(n);
        self.code_phase.truncate(n);
        self.code_phase_acc.truncate(n);
        self.code_freq.truncate(n);
        self.carr_phase.truncate(n);
        self.carr_phase_acc.truncate(n);
        self.carr_freq.truncate(n);
        self.e.truncate(n);
        self.p.truncate(n);
        self.l.truncate(n);
        self.cn0.truncate(n);
        self.tow.truncate(n);
        self.coherent_ms.truncate(n);
        self.nav_msg_bit_phase_ref.truncate(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_shrinks_every_series_consistently() {
        let mut tr = TrackResult::with_capacity(1, 10);
        for i in 0..10 {
            tr.absolute_sample.push(i);
            tr.code_phase.push(0.0);
            tr.code_phase_acc.push(0.0);
            tr.code_freq.push(0.0);
            tr.carr_phase.push(0.0);
            tr.carr_phase_acc.push(0.0);
            tr.carr_freq.push(0.0);
            tr.e.push(Complex64::default());
            tr.p.push(Complex64::default());
            tr.l.push(Complex64::default());
            tr.cn0.push(0.0);
            tr.tow.push(None);
            tr.coherent_ms.push(1);
            tr.nav_msg_bit_phase_ref.push(-1);
        }
        tr.truncate(4);
        assert_eq!(tr.len(), 4);
        assert_eq!(tr.p.len(), 4);
        assert_eq!(tr.nav_msg_bit_phase_ref.len(), 4);
    }
}
