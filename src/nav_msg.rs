/// External navigation-message decoder collaborator.
///
/// The tracking core treats the decoder's internal state as opaque: it
/// only consumes a possible fresh time-of-week and a bit-phase
/// reference it may contribute to the bit synchroniser (used by the
/// `LibSwiftNav` [`crate::bit_sync::BitSyncVariant`]).
pub trait NavMsgDecoder: Send {
    /// Feeds one coherent prompt value (`ms` milliseconds wide) to the
    /// decoder. Returns a freshly decoded TOW (seconds into week) when a
    /// subframe boundary was just decoded.
    fn update(&mut self, prompt_real: f64, ms: usize) -> Option<u32>;

    /// The decoder's own bit-phase reference, or `-1` if it hasn't
    /// determined one yet.
    fn bit_phase_ref(&self) -> i32;
}

/// A decoder that never produces a TOW or bit-phase reference.
///
/// Useful when a channel is tracked purely for its correlator/loop
/// filter behavior and no nav-message decoding is wired in (e.g.
/// synthetic-signal tests, or bit-sync variants other than
/// `LibSwiftNav`).
#[derive(Default)]
pub struct NullNavMsg;

impl NavMsgDecoder for NullNavMsg {
    fn update(&mut self, _prompt_real: f64, _ms: usize) -> Option<u32> {
        None
    }

    fn bit_phase_ref(&self) -> i32 {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_decoder_never_reports_tow_or_sync() {
        let mut nav = NullNavMsg;
        assert_eq!(nav.update(1.0, 1), None);
        assert_eq!(nav.bit_phase_ref(), -1);
    }
}
