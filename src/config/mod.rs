#[allow(clippy::module_inception)]
mod config;

pub use config::{AnalysisSettings, ExplorerSettings, FetchMode, RpcSettings, Settings};
