//! SensorNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod events;
pub mod pins;
pub mod registry;
pub mod scheduler;
pub mod sessions;
pub mod sync;

// The ESP-IDF-only parts of these are guarded by cfg attributes inside;
// on the host they fall back to in-memory simulation.
pub mod adapters;
pub mod drivers;
