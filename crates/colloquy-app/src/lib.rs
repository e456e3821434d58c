pub mod cli;
pub mod routes;
pub mod server;
pub mod setup;

pub use server::{build_router, AppState};
