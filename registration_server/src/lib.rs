//! # Candidate Payment Gateway server
//! This crate hosts the HTTP transport for the registration and reconciliation engine. It is responsible for:
//! * Receiving and verifying payment-gateway webhook deliveries (raw-body HMAC before any parsing).
//! * Receiving client-side payment verification callbacks and checking their detached signatures.
//! * Exposing the operator API: registrations, reconciliation sweeps, attendance, certificates, decisions.
//! * Running the periodic reconciliation sweep worker.
//!
//! ## Configuration
//! The server is configured via environment variables (prefix `CPG_`). See [config](config/index.html).
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod signature;
pub mod sweep_worker;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
