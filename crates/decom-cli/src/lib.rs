pub mod case;
pub mod cli;
pub mod config;

pub use case::{load_network, CaseFile};
pub use cli::{Cli, Commands};
pub use config::DecomConfig;
