pub mod routes;
mod server;
pub use server::{app, cors_layer, serve};
pub(crate) use server::init_tracing;
pub mod public;
mod state;
pub use state::AppState;
