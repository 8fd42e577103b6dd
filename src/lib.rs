//! Llama Launcher Library
//!
//! Core functionality for launching and supervising the llama.cpp inference
//! server: model discovery, persisted profiles and form layout, command
//! construction, and process supervision.

// Module declarations
pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod server;
pub mod services;
