use crate::arin::xml::{FromXml, RPKI_NS, ToXml, XmlNode, XmlWriter};
use crate::error::ParseError;
use crate::validation::{ValidationError, validate_not_empty};

symbol_enum! {
    /// Resource class a ROA is filed under (which RIR issued the space).
    ResourceClass, InvalidResourceClass {
        Arin => "AR",
        Apnic => "AP",
        Ripe => "RN",
        Lacnic => "LN",
        Afrinic => "AF",
    }
}

/// Signed Route Origin Authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoaPayload {
    pub signature: String,
    /// `|`-delimited ROA data the signature covers.
    pub roa_data: String,
}

impl RoaPayload {
    pub fn new(
        signature: impl Into<String>,
        roa_data: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let roa = Self {
            signature: signature.into(),
            roa_data: roa_data.into(),
        };
        validate_not_empty("signature", &roa.signature)?;
        validate_not_empty("roa data", &roa.roa_data)?;
        Ok(roa)
    }
}

impl ToXml for RoaPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, RPKI_NS);
        w.text("signature", &self.signature)
            .text("roaData", &self.roa_data);
        w.finish()
    }
}

impl FromXml for RoaPayload {
    const ROOT: &'static str = "roa";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        Ok(Self {
            signature: node.text_at("signature").unwrap_or_default(),
            roa_data: node.text_at("roaData").unwrap_or_default(),
        })
    }
}
