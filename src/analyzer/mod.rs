pub mod ffprobe;

pub use ffprobe::{FileProbe, StreamInspector};
