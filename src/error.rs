// src/error.rs
use thiserror::Error;

pub use crate::validation::ValidationError;

/// A registry response body did not have the shape its payload expects.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response contains no root element")]
    MissingRoot,

    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("invalid value '{value}' for {field}")]
    InvalidField { field: String, value: String },

    #[error("invalid field in response: {0}")]
    Invalid(#[from] ValidationError),

    #[error("ticketed request carries an unsupported <{kind}> payload")]
    UnsupportedTicketPayload { kind: String },

    #[error("ticket {ticket_no} has not been resolved yet")]
    UnresolvedTicket { ticket_no: String },
}

/// Bad client-side configuration, caught before any request leaves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("invalid method '{0}' (expected GET, POST, PUT or DELETE)")]
    InvalidMethod(String),

    #[error("invalid accept format '{0}' (expected xml, json, html or plain)")]
    InvalidFormat(String),

    #[error("{0} requests carry no body")]
    UnexpectedBody(&'static str),

    #[error("registry base URL must not be empty")]
    MissingBaseUrl,

    #[error("registry API key must not be empty")]
    MissingApiKey,
}

/// Non-200 answer from the registry, carried verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("registry returned {status}: {body}")]
pub struct RegistryError {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum ArinError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("registry request to {resource} failed: {source}")]
    Http {
        resource: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ArinError {
    /// HTTP status of a registry rejection, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ArinError::Registry(e) => Some(e.status),
            _ => None,
        }
    }
}
