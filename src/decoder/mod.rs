pub mod parser;
pub mod record;

pub use parser::{decode_log, decode_logs, DecodeResult};
pub use record::{DecodeReport, EventKind, SwapAmounts, SwapRecord, TopicMap};
