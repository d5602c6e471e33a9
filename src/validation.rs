use regex::Regex;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid net type '{0}'")]
    InvalidNetType(String),
    #[error("invalid POC link function '{0}' (expected AD, AB, N or T)")]
    InvalidPocFunction(String),
    #[error("invalid phone type '{0}' (expected O, F or M)")]
    InvalidPhoneType(String),
    #[error("invalid message category '{0}' (expected NONE or JUSTIFICATION)")]
    InvalidMessageCategory(String),
    #[error("invalid delegation digest type {0} (expected 1 or 2)")]
    InvalidDigestType(u8),
    #[error("invalid delegation algorithm {0} (expected 5, 7 or 8)")]
    InvalidAlgorithm(u8),
    #[error("invalid ROA resource class '{0}'")]
    InvalidResourceClass(String),
    #[error("invalid IP version {0} (expected 4 or 6)")]
    InvalidVersion(u8),
    #[error("net block start address '{address}' is not an IPv{version} address")]
    VersionMismatch { address: String, version: u8 },
    #[error("net block end address and CIDR length are mutually exclusive")]
    EndAddressAndCidrLength,
    #[error("CIDR length {0} is out of range")]
    InvalidCidrLength(u8),
    #[error("net must reference exactly one of org handle or customer handle")]
    NetOwner,
    #[error("net needs at least one net block")]
    NoNetBlocks,
    #[error("invalid origin AS '{0}'")]
    InvalidOriginAs(String),
    #[error("invalid handle '{0}'")]
    InvalidHandle(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{country} addresses require {field}")]
    MissingAddressField { country: String, field: &'static str },
    #[error("phone number or phone type required")]
    PhoneSelector,
    #[error("attachment data is not valid base64")]
    AttachmentEncoding,
}

lazy_static::lazy_static! {
    /// Registry handles: letters, digits and '-', not starting with '-'
    static ref HANDLE_RE: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$").unwrap();
    /// "AS64500", "as64500" or a bare "64500"
    static ref ORIGIN_AS_RE: Regex = Regex::new(r"^(?i:AS)?([0-9]{1,10})$").unwrap();
}

pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    if handle.is_empty() {
        return Err(ValidationError::Empty("handle"));
    }
    if !HANDLE_RE.is_match(handle) {
        return Err(ValidationError::InvalidHandle(handle.to_string()));
    }
    Ok(())
}

/// Normalize an origin AS to the `AS<number>` form the registry expects.
pub fn normalize_origin_as(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let caps = ORIGIN_AS_RE
        .captures(trimmed)
        .ok_or_else(|| ValidationError::InvalidOriginAs(value.to_string()))?;
    let number: u32 = caps[1]
        .parse()
        .map_err(|_| ValidationError::InvalidOriginAs(value.to_string()))?;
    Ok(format!("AS{number}"))
}

pub fn validate_not_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}
