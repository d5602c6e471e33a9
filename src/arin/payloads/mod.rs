//! Typed Reg-RWS payloads.
//!
//! Every payload validates its enumerated and mutually exclusive fields when it
//! is built, serializes through [`ToXml`](crate::arin::xml::ToXml) and reads
//! back through [`FromXml`](crate::arin::xml::FromXml). Optional fields set to
//! `None` are left out of the document (the registry keeps its current value);
//! `Some("")` is written as an empty element (the registry clears the field).
//! `handle` and `registrationDate` belong to the registry: they are blank on
//! create and only ever filled from responses.

/// Enumeration backed by the registry's fixed symbol set.
macro_rules! symbol_enum {
    ($(#[$meta:meta])* $name:ident, $err:ident { $($variant:ident => $sym:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $sym),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::validation::ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($sym => Ok($name::$variant),)+
                    other => Err(crate::validation::ValidationError::$err(other.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod address;
pub mod customer;
pub mod delegation;
pub mod net;
pub mod org;
pub mod poc;
pub mod roa;
pub mod ticket;

pub use address::{Iso3166_1, PostalAddress};
pub use customer::CustomerPayload;
pub use delegation::{DelegationAlgorithm, DelegationKeyPayload, DelegationPayload, DigestType};
pub use net::{NetBlockPayload, NetPayload, NetPayloadBuilder, NetType};
pub use org::OrganizationPayload;
pub use poc::{PhonePayload, PhoneType, PocFunction, PocLinkPayload};
pub use roa::{ResourceClass, RoaPayload};
pub use ticket::{
    AttachmentPayload, MessageCategory, MessagePayload, TicketPayload, TicketedRequestPayload,
};
