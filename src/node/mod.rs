// Node module - the coin exchanger and its lifecycle

mod config;
mod exchanger;
mod state;

pub use config::{ConfigError, ExchangerConfig};
pub use exchanger::{CoinExchanger, ExchangerBuilder, ExchangerError, ExchangerStats};
pub use state::NodeState;
