#![doc = "The `tasktrack` library crate."]
#![doc = ""]
#![doc = "Session-based authentication, the task and user models, injection-safe"]
#![doc = "query building, persistence and routing for the task tracking service."]
#![doc = "The binary (`main.rs`) wires these together and runs the HTTP server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod validation;

pub use crate::error::AppError;
