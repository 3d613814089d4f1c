//! Remote code execution adapter for a Piston-compatible API.

mod dto;
mod http_client;

pub use http_client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, PistonHttpClient};
