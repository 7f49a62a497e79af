use std::error::Error;
use std::fmt;

/// Terminal status byte recorded on a [`crate::track_result::TrackResult`].
///
/// `'L'` is reserved for a future lock detector; nothing in this crate
/// constructs it today.
pub const STATUS_RUNNING: u8 = b'-';
pub const STATUS_TRACKED: u8 = b'T';
pub const STATUS_CANCELLED: u8 = b'C';
pub const STATUS_LOST_LOCK: u8 = b'L';

#[derive(Debug)]
pub enum TrackingError {
    /// The correlator ran off the end of the sample stream.
    StreamExhausted { prn: u8 },
    /// Fatal input validation failure; the driver never starts.
    InvalidParams(String),
    /// Cooperative cancellation observed mid-channel.
    Cancelled { prn: u8 },
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrackingError::StreamExhausted { prn } => {
                write!(f, "prn {prn}: stream exhausted before requested tracking length")
            }
            TrackingError::InvalidParams(msg) => write!(f, "invalid tracking params: {msg}"),
            TrackingError::Cancelled { prn } => write!(f, "prn {prn}: tracking cancelled"),
        }
    }
}

impl Error for TrackingError {}
