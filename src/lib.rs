// src/lib.rs

//! Status Relay Library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod scheduler;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
