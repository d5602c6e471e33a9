use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::net::NetPayload;
use crate::arin::xml::{CORE_NS, FromXml, ToXml, XmlNode, XmlWriter};
use crate::error::ParseError;
use crate::validation::{ValidationError, validate_not_empty};

symbol_enum! {
    MessageCategory, InvalidMessageCategory {
        None => "NONE",
        Justification => "JUSTIFICATION",
    }
}

/// File attached to a ticket message. `data` holds the base64 encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub data: String,
    pub filename: String,
}

impl AttachmentPayload {
    pub fn new(data: impl Into<String>, filename: impl Into<String>) -> Result<Self, ValidationError> {
        let attachment = Self {
            data: data.into(),
            filename: filename.into(),
        };
        validate_not_empty("attachment filename", &attachment.filename)?;
        Ok(attachment)
    }

    pub fn from_bytes(filename: impl Into<String>, content: &[u8]) -> Result<Self, ValidationError> {
        Self::new(BASE64.encode(content), filename)
    }

    pub fn decode(&self) -> Result<Vec<u8>, ValidationError> {
        BASE64
            .decode(self.data.trim())
            .map_err(|_| ValidationError::AttachmentEncoding)
    }

    fn write(&self, w: &mut XmlWriter) {
        w.text("data", &self.data).text("filename", &self.filename);
    }
}

impl ToXml for AttachmentPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        self.write(&mut w);
        w.finish()
    }
}

impl FromXml for AttachmentPayload {
    const ROOT: &'static str = "attachment";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        Ok(Self {
            data: node.text_at("data").unwrap_or_default(),
            filename: node.text_at("filename").unwrap_or_default(),
        })
    }
}

/// Message posted to a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePayload {
    pub subject: String,
    pub text: String,
    pub category: MessageCategory,
    pub attachments: Vec<AttachmentPayload>,
    message_id: Option<String>,
    created_date: Option<String>,
}

impl MessagePayload {
    pub fn new(
        subject: impl Into<String>,
        text: impl Into<String>,
        category: MessageCategory,
    ) -> Self {
        Self {
            subject: subject.into(),
            text: text.into(),
            category,
            attachments: Vec::new(),
            message_id: None,
            created_date: None,
        }
    }

    pub fn with_attachment(mut self, attachment: AttachmentPayload) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn created_date(&self) -> Option<&str> {
        self.created_date.as_deref()
    }

    fn write(&self, w: &mut XmlWriter) {
        w.opt_text("messageId", self.message_id.as_deref())
            .opt_text("createdDate", self.created_date.as_deref())
            .text("subject", &self.subject)
            .lines("text", Some(self.text.as_str()))
            .text("category", self.category.as_str());
        if !self.attachments.is_empty() {
            w.open("attachments");
            for attachment in &self.attachments {
                w.open("attachment");
                attachment.write(w);
                w.close();
            }
            w.close();
        }
    }
}

impl ToXml for MessagePayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        self.write(&mut w);
        w.finish()
    }
}

impl FromXml for MessagePayload {
    const ROOT: &'static str = "message";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let category = match node.assigned_at("category") {
            Some(c) => c.parse()?,
            None => MessageCategory::None,
        };
        let attachments = match node.child("attachments") {
            Some(list) => list
                .children_named("attachment")
                .map(AttachmentPayload::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            subject: node.text_at("subject").unwrap_or_default(),
            text: node.lines_at("text").unwrap_or_default(),
            category,
            attachments,
            message_id: node.assigned_at("messageId"),
            created_date: node.assigned_at("createdDate"),
        })
    }
}

/// Registry ticket. Every field is registry-owned; a ticket is only built
/// locally to send a status change back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TicketPayload {
    pub ticket_no: Option<String>,
    pub created_date: Option<String>,
    pub resolved_date: Option<String>,
    pub closed_date: Option<String>,
    pub updated_date: Option<String>,
    /// `webTicketType`, e.g. "NET_REASSIGN".
    pub ticket_type: Option<String>,
    /// `webTicketStatus`, e.g. "PENDING_REVIEW", "RESOLVED".
    pub status: Option<String>,
    /// `webTicketResolution`, e.g. "ACCEPTED".
    pub resolution: Option<String>,
    pub messages: Vec<MessagePayload>,
}

impl TicketPayload {
    fn write(&self, w: &mut XmlWriter) {
        if !self.messages.is_empty() {
            w.open("messages");
            for message in &self.messages {
                w.open("message");
                message.write(w);
                w.close();
            }
            w.close();
        }
        w.opt_text("ticketNo", self.ticket_no.as_deref())
            .opt_text("createdDate", self.created_date.as_deref())
            .opt_text("resolvedDate", self.resolved_date.as_deref())
            .opt_text("closedDate", self.closed_date.as_deref())
            .opt_text("updatedDate", self.updated_date.as_deref())
            .opt_text("webTicketType", self.ticket_type.as_deref())
            .opt_text("webTicketStatus", self.status.as_deref())
            .opt_text("webTicketResolution", self.resolution.as_deref());
    }
}

impl ToXml for TicketPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        self.write(&mut w);
        w.finish()
    }
}

impl FromXml for TicketPayload {
    const ROOT: &'static str = "ticket";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let messages = match node.child("messages") {
            Some(list) => list
                .children_named("message")
                .map(MessagePayload::from_node)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            ticket_no: node.assigned_at("ticketNo"),
            created_date: node.assigned_at("createdDate"),
            resolved_date: node.assigned_at("resolvedDate"),
            closed_date: node.assigned_at("closedDate"),
            updated_date: node.assigned_at("updatedDate"),
            ticket_type: node.assigned_at("webTicketType"),
            status: node.assigned_at("webTicketStatus"),
            resolution: node.assigned_at("webTicketResolution"),
            messages,
        })
    }
}

/// Answer to an asynchronous registry operation. Either the registry has
/// already materialized the result and embeds it, or it returns the ticket
/// tracking the pending request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TicketedRequestPayload {
    pub ticket: Option<TicketPayload>,
    pub net: Option<NetPayload>,
    /// Root name of an embedded payload this client does not model.
    other: Option<String>,
}

impl TicketedRequestPayload {
    pub fn resolved(net: NetPayload) -> Self {
        Self {
            net: Some(net),
            ..Default::default()
        }
    }

    pub fn pending(ticket: TicketPayload) -> Self {
        Self {
            ticket: Some(ticket),
            ..Default::default()
        }
    }

    pub fn is_pending(&self) -> bool {
        self.net.is_none() && self.other.is_none() && self.ticket.is_some()
    }

    /// The embedded net. Other embedded kinds and still-pending tickets are
    /// errors: nothing downstream knows what to persist for them.
    pub fn into_net(self) -> Result<NetPayload, ParseError> {
        if let Some(net) = self.net {
            return Ok(net);
        }
        if let Some(kind) = self.other {
            return Err(ParseError::UnsupportedTicketPayload { kind });
        }
        match self.ticket {
            Some(ticket) => Err(ParseError::UnresolvedTicket {
                ticket_no: ticket.ticket_no.unwrap_or_else(|| "(unnumbered)".into()),
            }),
            None => Err(ParseError::Malformed(
                "ticketed request carries neither a ticket nor a payload".into(),
            )),
        }
    }
}

impl ToXml for TicketedRequestPayload {
    fn to_xml(&self) -> String {
        let mut w = XmlWriter::root(Self::ROOT, CORE_NS);
        if let Some(ticket) = &self.ticket {
            w.open("ticket");
            ticket.write(&mut w);
            w.close();
        }
        if let Some(net) = &self.net {
            w.open("net");
            net.write(&mut w);
            w.close();
        }
        if let Some(other) = &self.other {
            w.open(other).close();
        }
        w.finish()
    }
}

impl FromXml for TicketedRequestPayload {
    const ROOT: &'static str = "ticketedRequest";

    fn from_node(node: &XmlNode) -> Result<Self, ParseError> {
        let mut request = Self::default();
        for child in &node.children {
            match child.name.as_str() {
                "ticket" => request.ticket = Some(TicketPayload::from_node(child)?),
                "net" => request.net = Some(NetPayload::from_node(child)?),
                other => request.other = Some(other.to_string()),
            }
        }
        Ok(request)
    }
}
