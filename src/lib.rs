pub mod auth;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

#[doc(hidden)]
pub mod testing;

pub use routes::app;
pub use state::AppState;
