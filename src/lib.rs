pub mod config;
pub mod errors;
pub mod events;
pub mod generator;
pub mod guard;
pub mod logging;
pub mod parser;
pub mod period;
pub mod prompts;
pub mod schema;
pub mod server;
pub mod store;
pub mod stream;
pub mod turn;
