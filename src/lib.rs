pub mod abis;
pub mod config;
pub mod decoder;
pub mod error;
pub mod explorer;
pub mod filter;
pub mod pair;
pub mod pipeline;
pub mod plot;
pub mod signatures;
pub mod utils;

pub use config::Settings;
pub use decoder::{DecodeReport, SwapRecord};
pub use error::{AbiError, DecodeError, FetchError};
pub use explorer::{ExplorerClient, LogFetcher, LogQuery, LogSource};
pub use pipeline::{analyze, Analysis, RunReport};
pub use signatures::EventSignatures;
