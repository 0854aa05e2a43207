// Root library of the `gradplan` crate.
// Re-exports the main modules and a convenience `run_server` that `main` uses
// to boot the HTTP API.
pub mod models;
pub mod gateway;
pub mod algorithm;
pub mod analytics;
pub mod server;

/// Run the HTTP API server (re-export for ease of use from `main`)
pub use server::run_server;
