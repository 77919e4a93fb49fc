//! CLI command implementations.
//!
//! | Module      | Commands handled                 |
//! |-------------|----------------------------------|
//! | `serve`     | `Serve`                          |
//! | `document`  | `Parse`, `Normalize`, `Sample`   |
//! | `schema`    | `Schema`                         |
//! | `config`    | `Config`                         |

pub mod config;
pub mod document;
pub mod schema;
pub mod serve;

pub use config::cmd_config;
pub use document::{cmd_normalize, cmd_parse, cmd_sample};
pub use schema::cmd_schema;
pub use serve::cmd_serve;
