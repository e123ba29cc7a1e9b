#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Holds the authentication core (password hashing, signed tokens, identity"]
#![doc = "resolution and login), the domain models, persistence, routing configuration"]
#![doc = "and error handling. The binary (`main.rs`) only loads configuration and keys"]
#![doc = "and runs the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;

pub use crate::error::AppError;
pub use crate::state::AppState;
