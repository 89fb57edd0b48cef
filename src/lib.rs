//! Lexchat - a terminal client for a streaming legal-assistant chat backend
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod app;
pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod models;
pub mod state;
pub mod traits;
pub mod turn;
pub mod upload;
pub mod websocket;
