use super::poc::PocLinkPayload;
use crate::arin::xml::{CORE_NS, FromXml, ToXml, XmlNode, XmlWriter};
use crate::error::ParseError;
use crate::validation::{ValidationError, normalize_origin_as, validate_handle, validate_not_empty};

symbol_enum! {
    /// Registry network classification codes.
    NetType, InvalidNetType {
        Assignment => "A",
        AfrinicAllocation => "AF",
        ApnicAllocation => "AP",
        ArinAllocation => "AR",
        ArinAssignment => "AV",
        DirectAllocation => "DA",
        DirectAssignment => "DS",
        ArinTransferred => "FX",
        IanaReserved => "IR",
        IanaUnallocated => "IU",
        LacnicAllocation => "LN",
        LacnicTransferred => "LX",
        ProviderAllocation => "PV",
        ProviderTransferred => "PX",
        RipeAllocation => "RD",
        RipeTransferred => "RN",
        Reallocation => "RV",
        ReallocationTransferred => "RX",
        Reassignment => "S",
    }
}

fn address_version(address: &str) -> Option<u8> {
    if address.contains(':') {
        Some(6)
    } else if address.contains('.') {
        Some(4)
    } else {
        None
    }
}

/// One contiguous block of a net, given either by end address or by CIDR
/// length, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetBlockPayload {
    pub net_type: Option<NetType>,
    pub description: String,
    pub start_address: String,
    pub end_address: Option<String>,
    pub cidr_length: Option<u8>,
    /// Address family; derived from `start_address` when not given.
    pub version: Option<u8>,
}

impl NetBlockPayload {
    pub fn new(
        net_type: Option<NetType>,
        description: impl Into<String>,
        start_address: impl Into<String>,
        end_address: Option<String>,
        cidr_length: Option<u8>,
        version: Option<u8>,
    ) -> Result<Self, ValidationError> {
        let start_address = start_address.into();
        let block = Self {
            net_type,
            description: description.into(),
            version: version.or_else(|| address_version(&start_address)),
            start_address,
            end_address,
            cidr_length,
        };
        block.validate()?;
        Ok(block)
    }

    /// Block covering `start_address/cidr_length`.
    pub fn cidr(
        start_address: impl Into<String>,
        cidr_length: u8,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(None, description, start_address, None, Some(cidr_length), None)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_not_empty("start address", &self.start_address)?;
        if self.end_address.is_some() && self.cidr_length.is_some() {
            return Err(ValidationError::EndAddressAndCidrLength);
        }
        if let Some(version) = self.version {
            if version != 4 && version != 6 {
                return Err(ValidationError::InvalidVersion(version));
            }
            if address_version(&self.start_address).is_some_and(|v| v != version) {
                return Err(ValidationError::VersionMismatch {
                    address: self.start_address.clone(),
                    version,
                });
            }
        }
        if let Some(len) = self.cidr_length {
            let max = if self.version == Some(4) { 32 } else { 128 };
            if len > max {
                return Err(ValidationError::InvalidCidrLength(len));
            }
        }
        Ok(())
    }

    fn write(&self, w: &mut XmlWriter) {
        if let Some(net_type) = self.net_type {
            w.text("type", net_type.as_str());
        }
        w.text("description", &self.description)
            .text("startAddress", &self.start_address)
            .opt_text("endAddress", self.end_address.as_deref());
        if let Some(len) = self.cidr_length {
            w.text("cidrLength", &len.to_string());
        }
    }
}

impl ToXml for NetBlockPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        self.write(&mut w);
        w.finish()
    }
}

impl FromXml for NetBlockPayload {
    const ROOT: &'static str = "netBlock";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let net_type = match node.assigned_at("type") {
            Some(t) => Some(t.parse()?),
            None => None,
        };
        let start_address = node.text_at("startAddress").unwrap_or_default();
        Ok(Self {
            net_type,
            description: node.text_at("description").unwrap_or_default(),
            version: address_version(&start_address),
            start_address,
            end_address: node.assigned_at("endAddress"),
            cidr_length: node.parse_at("cidrLength")?,
        })
    }
}

/// A registered network. References its owner by handle: exactly one of
/// `org_handle` / `customer_handle` is set on anything submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetPayload {
    pub version: u8,
    pub comment: Option<String>,
    pub net_blocks: Vec<NetBlockPayload>,
    pub parent_net_handle: Option<String>,
    pub net_name: Option<String>,
    pub origin_ases: Vec<String>,
    pub poc_links: Vec<PocLinkPayload>,
    pub org_handle: Option<String>,
    pub customer_handle: Option<String>,
    handle: Option<String>,
    registration_date: Option<String>,
}

impl NetPayload {
    pub fn builder(version: u8) -> NetPayloadBuilder {
        NetPayloadBuilder {
            net: NetPayload {
                version,
                comment: None,
                net_blocks: Vec::new(),
                parent_net_handle: None,
                net_name: None,
                origin_ases: Vec::new(),
                poc_links: Vec::new(),
                org_handle: None,
                customer_handle: None,
                handle: None,
                registration_date: None,
            },
        }
    }

    /// Checks run before any net is sent to the registry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != 4 && self.version != 6 {
            return Err(ValidationError::InvalidVersion(self.version));
        }
        if self.net_blocks.is_empty() {
            return Err(ValidationError::NoNetBlocks);
        }
        for block in &self.net_blocks {
            block.validate()?;
            if block.version.is_some_and(|v| v != self.version) {
                return Err(ValidationError::VersionMismatch {
                    address: block.start_address.clone(),
                    version: self.version,
                });
            }
        }
        match (&self.org_handle, &self.customer_handle) {
            (Some(handle), None) | (None, Some(handle)) => validate_handle(handle)?,
            _ => return Err(ValidationError::NetOwner),
        }
        if let Some(parent) = &self.parent_net_handle {
            validate_handle(parent)?;
        }
        for origin in &self.origin_ases {
            normalize_origin_as(origin)?;
        }
        Ok(())
    }

    pub fn handle(&self) -> Option<&str> {
        self.handle.as_deref()
    }

    pub fn registration_date(&self) -> Option<&str> {
        self.registration_date.as_deref()
    }

    pub(crate) fn write(&self, w: &mut XmlWriter) {
        w.text("version", &self.version.to_string())
            .lines("comment", self.comment.as_deref())
            .text(
                "registrationDate",
                self.registration_date.as_deref().unwrap_or_default(),
            )
            .text("handle", self.handle.as_deref().unwrap_or_default());

        w.open("netBlocks");
        for block in &self.net_blocks {
            w.open("netBlock");
            block.write(w);
            w.close();
        }
        w.close();

        w.opt_text("parentNetHandle", self.parent_net_handle.as_deref())
            .opt_text("netName", self.net_name.as_deref());

        if !self.origin_ases.is_empty() {
            w.open("originASes");
            for origin in &self.origin_ases {
                w.text("originAS", origin);
            }
            w.close();
        }
        if !self.poc_links.is_empty() {
            w.open("pocLinks");
            for link in &self.poc_links {
                link.write(w, None);
            }
            w.close();
        }

        w.opt_text("orgHandle", self.org_handle.as_deref())
            .opt_text("customerHandle", self.customer_handle.as_deref());
    }
}

impl ToXml for NetPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        self.write(&mut w);
        w.finish()
    }
}

impl FromXml for NetPayload {
    const ROOT: &'static str = "net";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let net_blocks = match node.child("netBlocks") {
            Some(blocks) => blocks
                .children_named("netBlock")
                .map(NetBlockPayload::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let version = match node.parse_at::<u8>("version")? {
            Some(v) => v,
            None => net_blocks
                .first()
                .and_then(|b| b.version)
                .ok_or_else(|| ParseError::InvalidField {
                    field: "version".into(),
                    value: String::new(),
                })?,
        };
        let origin_ases = node
            .child("originASes")
            .map(|o| o.children_named("originAS").map(|a| a.text.clone()).collect())
            .unwrap_or_default();
        let poc_links = match node.child("pocLinks") {
            Some(links) => links
                .children_named("pocLinkRef")
                .map(PocLinkPayload::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            version,
            comment: node.lines_at("comment"),
            net_blocks,
            parent_net_handle: node.assigned_at("parentNetHandle"),
            net_name: node.text_at("netName"),
            origin_ases,
            poc_links,
            org_handle: node.assigned_at("orgHandle"),
            customer_handle: node.assigned_at("customerHandle"),
            handle: node.assigned_at("handle"),
            registration_date: node.assigned_at("registrationDate"),
        })
    }
}

pub struct NetPayloadBuilder {
    net: NetPayload,
}

impl NetPayloadBuilder {
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.net.comment = Some(comment.into());
        self
    }

    pub fn net_block(mut self, block: NetBlockPayload) -> Self {
        self.net.net_blocks.push(block);
        self
    }

    pub fn parent_net_handle(mut self, handle: impl Into<String>) -> Self {
        self.net.parent_net_handle = Some(handle.into());
        self
    }

    pub fn net_name(mut self, name: impl Into<String>) -> Self {
        self.net.net_name = Some(name.into());
        self
    }

    pub fn origin_ases<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.net.origin_ases.extend(origins.into_iter().map(Into::into));
        self
    }

    pub fn poc_link(mut self, link: PocLinkPayload) -> Self {
        self.net.poc_links.push(link);
        self
    }

    pub fn org_handle(mut self, handle: impl Into<String>) -> Self {
        self.net.org_handle = Some(handle.into());
        self
    }

    pub fn customer_handle(mut self, handle: impl Into<String>) -> Self {
        self.net.customer_handle = Some(handle.into());
        self
    }

    /// Normalize origin ASes to `AS<n>` and validate the whole net.
    pub fn build(mut self) -> Result<NetPayload, ValidationError> {
        self.net.origin_ases = self
            .net
            .origin_ases
            .iter()
            .map(|o| normalize_origin_as(o))
            .collect::<Result<_, _>>()?;
        self.net.validate()?;
        Ok(self.net)
    }
}
