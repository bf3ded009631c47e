pub mod jobs;
pub mod rest;
pub mod session;
pub mod state;

// Re-export the router builder and OpenAPI document to make them easily
// accessible to the binaries that build the web server.
pub use rest::{router, ApiDoc};
