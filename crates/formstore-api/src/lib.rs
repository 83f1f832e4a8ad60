pub mod config;
pub mod controller;
pub mod error;
pub mod finisher;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use error::ApiError;
pub use state::ApiState;
