//! In-memory job-board API used for demos and end-to-end tests.

mod infra;
mod routes;
mod server;

pub use infra::{AppState, SandboxError, SandboxStore};
pub use routes::app;
pub use server::spawn;

pub(crate) use server::run;
