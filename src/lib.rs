pub mod config;
pub mod door;
pub mod error;
pub mod relay;
pub mod schedule;
pub mod service;
pub mod settings;
