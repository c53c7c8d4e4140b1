//! Merchant payment record service
//!
//! Tracks payments between merchants and customers through a small status
//! state machine, backed by Postgres or in-memory storage and served over an
//! authenticated JSON API.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod services;
