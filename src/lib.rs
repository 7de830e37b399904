#[macro_use]
mod macros;

pub mod auction;
pub mod bidding;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod event_store;
pub mod handlers;
pub mod message_broker;
pub mod moderation;
pub mod notifications;
pub mod products;
pub mod query;
pub mod reports;
pub mod scheduler;
pub mod state;
pub mod trust;
pub mod users;
