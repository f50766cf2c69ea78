pub mod segmenter;

pub use segmenter::{SentenceSegmenter, Sentences};
