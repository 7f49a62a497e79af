pub mod bit_sync;
pub mod ca_code;
pub mod channel_seed;
pub mod cn0;
pub mod config;
pub mod constants;
pub mod correlator;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod loop_filter;
pub mod nav_msg;
pub mod sample_stream;
pub mod track_result;

pub use bit_sync::{BitSync, BitSyncVariant};
pub use ca_code::ca_code_table;
pub use channel_seed::ChannelSeed;
pub use cn0::CN0Estimator;
pub use config::{LoopFilterClass, LoopFilterParams, TrackConfig};
pub use correlator::{Correlator, CorrelatorOutput, DefaultCorrelator};
pub use dispatch::track;
pub use driver::ChannelDriver;
pub use error::TrackingError;
pub use loop_filter::LoopFilter;
pub use nav_msg::{NavMsgDecoder, NullNavMsg};
pub use sample_stream::{SampleStream, SliceSampleStream};
pub use track_result::TrackResult;
