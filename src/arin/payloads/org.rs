use super::address::PostalAddress;
use super::poc::PocLinkPayload;
use crate::arin::xml::{CORE_NS, FromXml, ToXml, XmlNode, XmlWriter};
use crate::error::ParseError;
use crate::validation::{ValidationError, validate_not_empty};

/// Organization record, the public counterpart of a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationPayload {
    pub org_name: String,
    pub address: PostalAddress,
    pub comment: Option<String>,
    /// "Doing business as" name.
    pub dba_name: Option<String>,
    pub tax_id: Option<String>,
    pub org_url: Option<String>,
    pub poc_links: Vec<PocLinkPayload>,
    handle: Option<String>,
    registration_date: Option<String>,
}

impl OrganizationPayload {
    pub fn new(org_name: impl Into<String>, address: PostalAddress) -> Result<Self, ValidationError> {
        let org = Self {
            org_name: org_name.into(),
            address,
            comment: None,
            dba_name: None,
            tax_id: None,
            org_url: None,
            poc_links: Vec::new(),
            handle: None,
            registration_date: None,
        };
        org.validate()?;
        Ok(org)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("org name", &self.org_name)?;
        self.address.validate()
    }

    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    pub fn registration_date(&self) -> Option<&str> {
        self.registration_date.as_deref()
    }
}

impl ToXml for OrganizationPayload {
    fn to_xml(&self) -> String {
        let a = &self.address;
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        w.text("handle", self.handle.as_deref().unwrap_or_default())
            .text(
                "registrationDate",
                self.registration_date.as_deref().unwrap_or_default(),
            );
        a.country.write(&mut w);
        w.lines("streetAddress", Some(a.street_address.as_str()))
            .text("city", &a.city)
            .opt_text("iso3166-2", a.iso3166_2.as_deref())
            .opt_text("postalCode", a.postal_code.as_deref())
            .lines("comment", self.comment.as_deref())
            .text("orgName", &self.org_name)
            .opt_text("dbaName", self.dba_name.as_deref())
            .opt_text("taxId", self.tax_id.as_deref())
            .opt_text("orgUrl", self.org_url.as_deref());
        if !self.poc_links.is_empty() {
            w.open("pocLinks");
            for link in &self.poc_links {
                link.write(&mut w, None);
            }
            w.close();
        }
        w.finish()
    }
}

impl FromXml for OrganizationPayload {
    const ROOT: &'static str = "org";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let poc_links = match node.child("pocLinks") {
            Some(links) => links
                .children_named("pocLinkRef")
                .map(PocLinkPayload::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            org_name: node.text_at("orgName").unwrap_or_default(),
            address: PostalAddress::read(node),
            comment: node.lines_at("comment"),
            dba_name: node.text_at("dbaName"),
            tax_id: node.text_at("taxId"),
            org_url: node.text_at("orgUrl"),
            poc_links,
            handle: node.assigned_at("handle"),
            registration_date: node.assigned_at("registrationDate"),
        })
    }
}
