mod config;
mod migration;
mod schema;
mod trade_custom_field;

pub use ::journal_core::*;
pub use config::*;
pub use migration::*;
pub use schema::*;
pub use trade_custom_field::*;
