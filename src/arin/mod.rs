//! ARIN Reg-RWS: payload model, XML codec and the REST client.

pub mod client;
pub mod payloads;
pub mod xml;

pub use client::{AcceptFormat, ArinClient, RegistryMethod};
