pub mod config;
pub mod http_client;
pub mod league_resolver;
pub mod logging;
pub mod match_fetch;
pub mod persist;
pub mod pipeline;
pub mod wire;
