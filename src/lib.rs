#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Bearer-token authentication with admin gating in front of a task store."]
#![doc = "Repositories own consistency (unique ids, unique usernames, precise"]
#![doc = "not-found), services own the business rules, and `routes` exposes both"]
#![doc = "over HTTP. The binary (`main.rs`) wires them to Postgres."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use crate::config::Config;
pub use crate::error::AppError;
