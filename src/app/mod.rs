//! Application core — pure domain orchestration, zero I/O.
//!
//! Ties the element registry, the sync engine, the command dispatcher and
//! the connection manager together in [`service::NodeService`].  All
//! interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
