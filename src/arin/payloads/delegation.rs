use crate::arin::xml::{CORE_NS, FromXml, ToXml, XmlNode, XmlWriter};
use crate::error::ParseError;
use crate::validation::{ValidationError, validate_not_empty};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestType {
    Sha1 = 1,
    Sha256 = 2,
}

impl TryFrom<u8> for DigestType {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DigestType::Sha1),
            2 => Ok(DigestType::Sha256),
            other => Err(ValidationError::InvalidDigestType(other)),
        }
    }
}

/// DNSSEC algorithms the registry accepts for DS records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelegationAlgorithm {
    RsaSha1 = 5,
    RsaSha1Nsec3Sha1 = 7,
    RsaSha256 = 8,
}

impl TryFrom<u8> for DelegationAlgorithm {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(DelegationAlgorithm::RsaSha1),
            7 => Ok(DelegationAlgorithm::RsaSha1Nsec3Sha1),
            8 => Ok(DelegationAlgorithm::RsaSha256),
            other => Err(ValidationError::InvalidAlgorithm(other)),
        }
    }
}

/// DS record attached to a reverse-DNS delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationKeyPayload {
    pub algorithm: DelegationAlgorithm,
    pub digest: String,
    pub ttl: u32,
    pub digest_type: DigestType,
    pub key_tag: u16,
}

impl DelegationKeyPayload {
    pub fn new(
        algorithm: u8,
        digest: impl Into<String>,
        ttl: u32,
        digest_type: u8,
        key_tag: u16,
    ) -> Result<Self, ValidationError> {
        let digest = digest.into();
        validate_not_empty("digest", &digest)?;
        Ok(Self {
            algorithm: algorithm.try_into()?,
            digest,
            ttl,
            digest_type: digest_type.try_into()?,
            key_tag,
        })
    }

    fn write(&self, w: &mut XmlWriter) {
        w.text("algorithm", &(self.algorithm as u8).to_string())
            .text("digest", &self.digest)
            .text("ttl", &self.ttl.to_string())
            .text("digestType", &(self.digest_type as u8).to_string())
            .text("keyTag", &self.key_tag.to_string());
    }
}

impl ToXml for DelegationKeyPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        self.write(&mut w);
        w.finish()
    }
}

impl FromXml for DelegationKeyPayload {
    const ROOT: &'static str = "delegationKey";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let algorithm: u8 = node.parse_at("algorithm")?.unwrap_or_default();
        let digest_type: u8 = node.parse_at("digestType")?.unwrap_or_default();
        Ok(Self {
            algorithm: algorithm.try_into()?,
            digest: node.text_at("digest").unwrap_or_default(),
            ttl: node.parse_at("ttl")?.unwrap_or_default(),
            digest_type: digest_type.try_into()?,
            key_tag: node.parse_at("keyTag")?.unwrap_or_default(),
        })
    }
}

/// Reverse-DNS delegation (`x.y.z.in-addr.arpa.`) with its nameservers and
/// DS records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationPayload {
    pub name: String,
    pub delegation_keys: Vec<DelegationKeyPayload>,
    pub nameservers: Vec<String>,
}

impl ToXml for DelegationPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        w.text("name", &self.name);
        w.open("delegationKeys");
        for key in &self.delegation_keys {
            w.open("delegationKey");
            key.write(&mut w);
            w.close();
        }
        w.close();
        w.open("nameservers");
        for ns in &self.nameservers {
            w.text("nameserver", ns);
        }
        w.finish()
    }
}

impl FromXml for DelegationPayload {
    const ROOT: &'static str = "delegation";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let delegation_keys = match node.child("delegationKeys") {
            Some(keys) => keys
                .children_named("delegationKey")
                .map(DelegationKeyPayload::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        let nameservers = node
            .child("nameservers")
            .map(|n| n.children_named("nameserver").map(|ns| ns.text.clone()).collect())
            .unwrap_or_default();
        Ok(Self {
            name: node.text_at("name").unwrap_or_default(),
            delegation_keys,
            nameservers,
        })
    }
}
