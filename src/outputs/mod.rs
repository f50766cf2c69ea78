pub mod sink;
pub mod speaker;

pub use sink::{ChannelSink, RecordingSink, SpeechSink};
pub use speaker::SpeakerWorker;
