//! # kfleet-registry
//!
//! File-backed registry of the devices a fleet configures: which printer
//! uses which profile. Stored as a JSON array (`fleet.json` by default) in
//! the configured data directory.

#![deny(unsafe_code)]

pub mod device;
pub mod errors;
pub mod registry;

pub use device::Device;
pub use errors::{RegistryError, Result};
pub use registry::{Registry, FLEET_FILE};
