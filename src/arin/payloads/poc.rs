use crate::arin::xml::{CORE_NS, FromXml, ToXml, XmlNode, XmlWriter};
use crate::error::ParseError;
use crate::validation::{ValidationError, validate_handle, validate_not_empty};

symbol_enum! {
    /// Role a POC plays for the record it is linked to.
    PocFunction, InvalidPocFunction {
        Admin => "AD",
        Abuse => "AB",
        Noc => "N",
        Tech => "T",
    }
}

symbol_enum! {
    PhoneType, InvalidPhoneType {
        Office => "O",
        Fax => "F",
        Mobile => "M",
    }
}

impl PhoneType {
    pub fn description(&self) -> &'static str {
        match self {
            PhoneType::Office => "Office",
            PhoneType::Fax => "Fax",
            PhoneType::Mobile => "Mobile",
        }
    }
}

/// Link from a net or org to a POC handle (`pocLinkRef`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PocLinkPayload {
    pub handle: String,
    pub function: PocFunction,
    /// Filled in by the registry ("Abuse", "Tech", ...).
    pub description: Option<String>,
}

impl PocLinkPayload {
    pub fn new(handle: impl Into<String>, function: PocFunction) -> Result<Self, ValidationError> {
        let handle = handle.into();
        validate_handle(&handle)?;
        Ok(Self {
            handle,
            function,
            description: None,
        })
    }

    pub(crate) fn write(&self, w: &mut XmlWriter, namespace: Option<&str>) {
        let mut attrs: Vec<(&str, &str)> = Vec::with_capacity(4);
        if let Some(ns) = namespace {
            attrs.push(("xmlns", ns));
        }
        if let Some(description) = &self.description {
            attrs.push(("description", description.as_str()));
        }
        attrs.push(("handle", self.handle.as_str()));
        attrs.push(("function", self.function.as_str()));
        w.open_with(Self::ROOT, &attrs).close();
    }
}

impl ToXml for PocLinkPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::fragment();
        self.write(&mut w, Some(CORE_NS));
        w.finish()
    }
}

impl FromXml for PocLinkPayload {
    const ROOT: &'static str = "pocLinkRef";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let function = node.attr("function").unwrap_or_default().parse()?;
        Ok(Self {
            handle: node.attr("handle").unwrap_or_default().to_string(),
            function,
            description: node.attr("description").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonePayload {
    pub phone_type: PhoneType,
    pub number: String,
    pub extension: Option<String>,
}

impl PhonePayload {
    pub fn new(
        phone_type: PhoneType,
        number: impl Into<String>,
        extension: Option<String>,
    ) -> Result<Self, ValidationError> {
        let number = number.into();
        validate_not_empty("phone number", &number)?;
        Ok(Self {
            phone_type,
            number,
            extension,
        })
    }
}

impl ToXml for PhonePayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        w.open("type")
            .text("description", self.phone_type.description())
            .text("code", self.phone_type.as_str())
            .close()
            .text("number", &self.number)
            .opt_text("extension", self.extension.as_deref());
        w.finish()
    }
}

impl FromXml for PhonePayload {
    const ROOT: &'static str = "phone";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let phone_type = node.text_at("type/code").unwrap_or_default().parse()?;
        Ok(Self {
            phone_type,
            number: node.text_at("number").unwrap_or_default(),
            extension: node.text_at("extension"),
        })
    }
}
