use super::address::PostalAddress;
use crate::arin::xml::{CORE_NS, FromXml, ToXml, XmlNode, XmlWriter};
use crate::error::ParseError;
use crate::validation::{ValidationError, validate_handle, validate_not_empty};

/// Recipient customer of a reassignment.
///
/// Unlike an org, a customer has no POCs and may be marked private, which
/// hides its name and address from public Whois.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerPayload {
    pub customer_name: String,
    pub address: PostalAddress,
    pub comment: Option<String>,
    pub parent_org_handle: Option<String>,
    pub private_customer: Option<bool>,
    handle: Option<String>,
    registration_date: Option<String>,
}

impl CustomerPayload {
    pub fn new(
        customer_name: impl Into<String>,
        address: PostalAddress,
        parent_org_handle: Option<String>,
        private_customer: bool,
    ) -> Result<Self, ValidationError> {
        let customer = Self {
            customer_name: customer_name.into(),
            address,
            comment: None,
            parent_org_handle,
            private_customer: Some(private_customer),
            handle: None,
            registration_date: None,
        };
        customer.validate()?;
        Ok(customer)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("customer name", &self.customer_name)?;
        self.address.validate()?;
        if let Some(parent) = &self.parent_org_handle {
            validate_handle(parent)?;
        }
        Ok(())
    }

    /// Registry-assigned handle; `None` until the registry has created it.
    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    pub fn registration_date(&self) -> Option<&str> {
        self.registration_date.as_deref()
    }
}

impl ToXml for CustomerPayload {
    fn to_xml(&self) -> String {
        let a = &self.address;
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        w.text("customerName", &self.customer_name);
        a.country.write(&mut w);
        w.text("handle", self.handle.as_deref().unwrap_or_default())
            .lines("streetAddress", Some(a.street_address.as_str()))
            .text("city", &a.city)
            .opt_text("iso3166-2", a.iso3166_2.as_deref())
            .opt_text("postalCode", a.postal_code.as_deref())
            .lines("comment", self.comment.as_deref())
            .opt_text("parentOrgHandle", self.parent_org_handle.as_deref())
            .text(
                "registrationDate",
                self.registration_date.as_deref().unwrap_or_default(),
            );
        if let Some(private) = self.private_customer {
            w.text("privateCustomer", if private { "true" } else { "false" });
        }
        w.finish()
    }
}

impl FromXml for CustomerPayload {
    const ROOT: &'static str = "customer";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        Ok(Self {
            customer_name: node.text_at("customerName").unwrap_or_default(),
            address: PostalAddress::read(node),
            comment: node.lines_at("comment"),
            parent_org_handle: node.text_at("parentOrgHandle"),
            private_customer: node.parse_at("privateCustomer")?,
            handle: node.assigned_at("handle"),
            registration_date: node.assigned_at("registrationDate"),
        })
    }
}
