use crate::arin::xml::{XmlNode, XmlWriter};
use crate::validation::{ValidationError, validate_not_empty};

/// Country block (`iso3166-1`) of customer and org payloads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Iso3166_1 {
    pub name: String,
    pub code2: String,
    pub code3: String,
    /// Telephone country code, e.g. "1".
    pub e164: String,
}

impl Iso3166_1 {
    pub fn new(
        name: impl Into<String>,
        code2: impl Into<String>,
        code3: impl Into<String>,
        e164: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code2: code2.into(),
            code3: code3.into(),
            e164: e164.into(),
        }
    }

    pub(crate) fn write(&self, w: &mut XmlWriter) {
        w.open("iso3166-1")
            .text("name", &self.name)
            .text("code2", &self.code2)
            .text("code3", &self.code3)
            .text("e164", &self.e164)
            .close();
    }

    pub(crate) fn read(node: &XmlNode) -> Self {
        let field = |name: &str| node.text_at(&format!("iso3166-1/{name}")).unwrap_or_default();
        Self {
            name: field("name"),
            code2: field("code2"),
            code3: field("code3"),
            e164: field("e164"),
        }
    }
}

/// Postal address as the registry models it. `street_address` may span
/// several lines separated by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostalAddress {
    pub country: Iso3166_1,
    pub street_address: String,
    pub city: String,
    /// Region code (`iso3166-2`), e.g. "NY".
    pub iso3166_2: Option<String>,
    pub postal_code: Option<String>,
}

impl PostalAddress {
    /// The registry requires a region and postal code for US and Canadian
    /// addresses; elsewhere both are optional.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("street address", &self.street_address)?;
        validate_not_empty("city", &self.city)?;
        if matches!(self.country.code2.as_str(), "US" | "CA") {
            let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
            if missing(&self.iso3166_2) {
                return Err(ValidationError::MissingAddressField {
                    country: self.country.code2.clone(),
                    field: "iso3166-2",
                });
            }
            if missing(&self.postal_code) {
                return Err(ValidationError::MissingAddressField {
                    country: self.country.code2.clone(),
                    field: "postalCode",
                });
            }
        }
        Ok(())
    }

    pub(crate) fn read(node: &XmlNode) -> Self {
        Self {
            country: Iso3166_1::read(node),
            street_address: node.lines_at("streetAddress").unwrap_or_default(),
            city: node.text_at("city").unwrap_or_default(),
            iso3166_2: node.text_at("iso3166-2"),
            postal_code: node.text_at("postalCode"),
        }
    }
}
