pub mod deps;
pub mod disk_space;
pub mod humanize;
pub mod interrupt;
pub mod logger;
pub mod timecode;

pub use deps::check_tools;
pub use humanize::{format_duration, format_file_size};
pub use logger::init_logging;
pub use timecode::{format_offset_ms, format_seconds, parse_timecode};
