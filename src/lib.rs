//! Crate entrypoint: ARIN Reg-RWS payloads and client, the IPAM and geocoding
//! collaborators, and the reassignment workflow that ties them together.

pub mod arin;
pub mod config;
pub mod error;
pub mod geocode;
pub mod ipam;
pub mod reassign;
pub mod validation;

pub use arin::ArinClient;
pub use error::{ArinError, ConfigurationError, ParseError, RegistryError, ValidationError};
pub use reassign::{BatchReport, PreconditionError, ReassignError, Reassigner};
