// src/lib.rs
//! Postgres schema for polls and votes, plus the coin voting feature.
//!
//! - `schema`: embedded migrations, applied once each in version order
//! - `poll`: storage operations over `polls` and `votes`
//! - `coins`: the coin feature's storage, price refresh and HTTP API

pub mod binance;
pub mod cli;
pub mod coins;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod poll;
pub mod routes;
pub mod schema;
pub mod services;

pub use coins::CoinStore;
pub use config::Config;
pub use error::{AppError, SchemaError, StoreError};
pub use poll::PollStore;
