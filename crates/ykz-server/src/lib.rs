pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod views;

pub use config::AppConfig;
pub use error::PageError;
pub use server::{AppState, DashboardServer, ServerBuilder, build_app};
