// Startup:
// 1. Capture the environment into a `ConfigSnapshot`
// 2. Check it against the base contract plus the selected provider's contract
// 3. Refuse to start (before binding) with the full report on any problem
// 4. Build the typed `ServerConfig`, the provider resolver and the gate
//
// System components:
//  - Configuration contract and validator
//  - Identity resolver (provider resource endpoint + user store)
//  - Auth gate (axum middleware)

pub mod auth;
pub mod config;
pub mod server;

#[cfg(test)]
mod e2e_tests;

pub use server::{AppState, StartupError, router};
