use std::str::FromStr;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

use crate::arin::payloads::*;
use crate::arin::xml::{FromXml, ToXml};
use crate::config::RegistryConfig;
use crate::error::{ArinError, ConfigurationError, RegistryError};
use crate::validation::{ValidationError, validate_handle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RegistryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryMethod::Get => "GET",
            RegistryMethod::Post => "POST",
            RegistryMethod::Put => "PUT",
            RegistryMethod::Delete => "DELETE",
        }
    }

    fn carries_body(&self) -> bool {
        matches!(self, RegistryMethod::Post | RegistryMethod::Put)
    }
}

impl FromStr for RegistryMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(RegistryMethod::Get),
            "POST" => Ok(RegistryMethod::Post),
            "PUT" => Ok(RegistryMethod::Put),
            "DELETE" => Ok(RegistryMethod::Delete),
            _ => Err(ConfigurationError::InvalidMethod(s.to_string())),
        }
    }
}

/// Representation asked for in the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AcceptFormat {
    #[default]
    Xml,
    Json,
    Html,
    Plain,
}

impl AcceptFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            AcceptFormat::Xml => "application/xml",
            AcceptFormat::Json => "application/json",
            AcceptFormat::Html => "text/html",
            AcceptFormat::Plain => "text/plain",
        }
    }
}

impl FromStr for AcceptFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(AcceptFormat::Xml),
            "json" => Ok(AcceptFormat::Json),
            "html" => Ok(AcceptFormat::Html),
            "plain" => Ok(AcceptFormat::Plain),
            _ => Err(ConfigurationError::InvalidFormat(s.to_string())),
        }
    }
}

/// Reg-RWS client. One call is one HTTP request; nothing is retried.
#[derive(Clone)]
pub struct ArinClient {
    http: Client,
    config: RegistryConfig,
}

impl ArinClient {
    pub fn new(config: RegistryConfig) -> Result<Self, ArinError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ArinError::Http {
                resource: config.base_url_root().to_string(),
                source,
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn auth(&self, req: RequestBuilder) -> RequestBuilder {
        req.query(&[("apikey", self.config.api_key.as_str())])
    }

    fn url(&self, resource: &str) -> String {
        self.config.resource_url(resource)
    }

    async fn execute(
        &self,
        resource: &str,
        body: Option<String>,
        method: RegistryMethod,
        accept: AcceptFormat,
    ) -> Result<reqwest::Response, ArinError> {
        if body.is_some() && !method.carries_body() {
            return Err(ConfigurationError::UnexpectedBody(method.as_str()).into());
        }
        let url = self.url(resource);
        debug!(method = method.as_str(), resource, "registry request");

        let req = match method {
            RegistryMethod::Get => self.http.get(url),
            RegistryMethod::Post => self.http.post(url),
            RegistryMethod::Put => self.http.put(url),
            RegistryMethod::Delete => self.http.delete(url),
        };
        let mut req = self.auth(req).header(ACCEPT, accept.mime());
        if method.carries_body() {
            req = req
                .header(CONTENT_TYPE, "application/xml")
                .body(body.unwrap_or_default());
        }

        let http_err = |source| ArinError::Http {
            resource: resource.to_string(),
            source,
        };
        let res = req.send().await.map_err(http_err)?;
        let status = res.status();
        debug!(resource, status = status.as_u16(), "registry response");
        if status != StatusCode::OK {
            let body = res.text().await.map_err(http_err)?;
            return Err(RegistryError {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(res)
    }

    /// Send one request and return the response body.
    pub async fn submit(
        &self,
        resource: &str,
        body: Option<String>,
        method: RegistryMethod,
        accept: AcceptFormat,
    ) -> Result<String, ArinError> {
        let res = self.execute(resource, body, method, accept).await?;
        res.text().await.map_err(|source| ArinError::Http {
            resource: resource.to_string(),
            source,
        })
    }

    /// [`submit`](Self::submit) with method and format given as strings, as
    /// they arrive from the command line.
    pub async fn submit_raw(
        &self,
        resource: &str,
        body: Option<String>,
        method: &str,
        accept: &str,
    ) -> Result<String, ArinError> {
        let method: RegistryMethod = method.parse()?;
        let accept: AcceptFormat = accept.parse()?;
        self.submit(resource, body, method, accept).await
    }

    async fn fetch<T: FromXml>(
        &self,
        resource: &str,
        body: Option<String>,
        method: RegistryMethod,
    ) -> Result<T, ArinError> {
        let text = self.submit(resource, body, method, AcceptFormat::Xml).await?;
        Ok(T::from_xml(&text)?)
    }

    async fn fetch_text(
        &self,
        resource: &str,
        body: Option<String>,
        method: RegistryMethod,
    ) -> Result<String, ArinError> {
        self.submit(resource, body, method, AcceptFormat::Xml).await
    }

    // reports

    pub async fn request_whowas_asn_report(
        &self,
        asn: &str,
    ) -> Result<TicketedRequestPayload, ArinError> {
        self.fetch(&format!("/report/whoWas/asn/{asn}"), None, RegistryMethod::Get)
            .await
    }

    pub async fn request_whowas_net_report(
        &self,
        address: &str,
    ) -> Result<TicketedRequestPayload, ArinError> {
        self.fetch(
            &format!("/report/whoWas/net/{address}"),
            None,
            RegistryMethod::Get,
        )
        .await
    }

    pub async fn request_associations_report(&self) -> Result<TicketedRequestPayload, ArinError> {
        self.fetch("/report/associations", None, RegistryMethod::Get)
            .await
    }

    pub async fn request_reassignment_report(
        &self,
        net_handle: &str,
    ) -> Result<TicketedRequestPayload, ArinError> {
        validate_handle(net_handle)?;
        self.fetch(
            &format!("/report/reassignment/{net_handle}"),
            None,
            RegistryMethod::Get,
        )
        .await
    }

    // POCs (bodies are passed through as XML text)

    pub async fn get_poc(&self, handle: &str) -> Result<String, ArinError> {
        validate_handle(handle)?;
        self.fetch_text(&format!("/poc/{handle}"), None, RegistryMethod::Get)
            .await
    }

    pub async fn delete_poc(&self, handle: &str) -> Result<String, ArinError> {
        validate_handle(handle)?;
        self.fetch_text(&format!("/poc/{handle}"), None, RegistryMethod::Delete)
            .await
    }

    pub async fn create_poc(&self, poc_xml: &str, make_link: bool) -> Result<String, ArinError> {
        self.fetch_text(
            &format!("/poc;makeLink={make_link}"),
            Some(poc_xml.to_string()),
            RegistryMethod::Post,
        )
        .await
    }

    pub async fn modify_poc(&self, handle: &str, poc_xml: &str) -> Result<String, ArinError> {
        validate_handle(handle)?;
        self.fetch_text(
            &format!("/poc/{handle}"),
            Some(poc_xml.to_string()),
            RegistryMethod::Put,
        )
        .await
    }

    pub async fn add_poc_phone(
        &self,
        handle: &str,
        phone: &PhonePayload,
    ) -> Result<String, ArinError> {
        validate_handle(handle)?;
        self.fetch_text(
            &format!("/poc/{handle}/phone"),
            Some(phone.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    /// Remove phones matching `number`, `phone_type`, or both.
    pub async fn delete_poc_phone(
        &self,
        handle: &str,
        number: Option<&str>,
        phone_type: Option<PhoneType>,
    ) -> Result<String, ArinError> {
        validate_handle(handle)?;
        let resource = phone_resource(handle, number, phone_type)?;
        self.fetch_text(&resource, None, RegistryMethod::Delete)
            .await
    }

    pub async fn add_poc_email(&self, handle: &str, email: &str) -> Result<String, ArinError> {
        validate_handle(handle)?;
        self.fetch_text(
            &format!("/poc/{handle}/email/{email}"),
            None,
            RegistryMethod::Post,
        )
        .await
    }

    pub async fn delete_poc_email(&self, handle: &str, email: &str) -> Result<String, ArinError> {
        validate_handle(handle)?;
        self.fetch_text(
            &format!("/poc/{handle}/email/{email}"),
            None,
            RegistryMethod::Delete,
        )
        .await
    }

    // customers

    pub async fn get_customer(&self, handle: &str) -> Result<CustomerPayload, ArinError> {
        validate_handle(handle)?;
        self.fetch(&format!("/customer/{handle}"), None, RegistryMethod::Get)
            .await
    }

    pub async fn delete_customer(&self, handle: &str) -> Result<CustomerPayload, ArinError> {
        validate_handle(handle)?;
        self.fetch(&format!("/customer/{handle}"), None, RegistryMethod::Delete)
            .await
    }

    pub async fn modify_customer(
        &self,
        handle: &str,
        customer: &CustomerPayload,
    ) -> Result<CustomerPayload, ArinError> {
        validate_handle(handle)?;
        customer.validate()?;
        self.fetch(
            &format!("/customer/{handle}"),
            Some(customer.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    // ROAs

    pub async fn create_roa(
        &self,
        org_handle: &str,
        roa: &RoaPayload,
        resource_class: ResourceClass,
    ) -> Result<TicketedRequestPayload, ArinError> {
        validate_handle(org_handle)?;
        self.fetch(
            &format!("/roa/{org_handle};resourceClass={resource_class}"),
            Some(roa.to_xml()),
            RegistryMethod::Post,
        )
        .await
    }

    // orgs

    pub async fn get_org(&self, handle: &str) -> Result<OrganizationPayload, ArinError> {
        validate_handle(handle)?;
        self.fetch(&format!("/org/{handle}"), None, RegistryMethod::Get)
            .await
    }

    pub async fn delete_org(&self, handle: &str) -> Result<OrganizationPayload, ArinError> {
        validate_handle(handle)?;
        self.fetch(&format!("/org/{handle}"), None, RegistryMethod::Delete)
            .await
    }

    /// New orgs go through registry review and come back as a ticket.
    pub async fn create_org(
        &self,
        org: &OrganizationPayload,
    ) -> Result<TicketedRequestPayload, ArinError> {
        org.validate()?;
        self.fetch("/org", Some(org.to_xml()), RegistryMethod::Post)
            .await
    }

    pub async fn modify_org(
        &self,
        handle: &str,
        org: &OrganizationPayload,
    ) -> Result<OrganizationPayload, ArinError> {
        validate_handle(handle)?;
        org.validate()?;
        self.fetch(
            &format!("/org/{handle}"),
            Some(org.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    pub async fn add_org_poc(
        &self,
        org_handle: &str,
        poc_handle: &str,
        function: PocFunction,
    ) -> Result<OrganizationPayload, ArinError> {
        validate_handle(org_handle)?;
        validate_handle(poc_handle)?;
        self.fetch(
            &format!("/org/{org_handle}/poc/{poc_handle};pocFunction={function}"),
            None,
            RegistryMethod::Put,
        )
        .await
    }

    pub async fn remove_org_poc(
        &self,
        org_handle: &str,
        poc_handle: &str,
        function: PocFunction,
    ) -> Result<OrganizationPayload, ArinError> {
        validate_handle(org_handle)?;
        validate_handle(poc_handle)?;
        self.fetch(
            &format!("/org/{org_handle}/poc/{poc_handle};pocFunction={function}"),
            None,
            RegistryMethod::Delete,
        )
        .await
    }

    // delegations

    pub async fn get_delegation(&self, name: &str) -> Result<DelegationPayload, ArinError> {
        self.fetch(&format!("/delegation/{name}"), None, RegistryMethod::Get)
            .await
    }

    pub async fn modify_delegation(
        &self,
        name: &str,
        delegation: &DelegationPayload,
    ) -> Result<DelegationPayload, ArinError> {
        self.fetch(
            &format!("/delegation/{name}"),
            Some(delegation.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    pub async fn add_delegation_nameserver(
        &self,
        name: &str,
        nameserver: &str,
    ) -> Result<DelegationPayload, ArinError> {
        self.fetch(
            &format!("/delegation/{name}/nameserver/{nameserver}"),
            None,
            RegistryMethod::Post,
        )
        .await
    }

    pub async fn delete_delegation_nameserver(
        &self,
        name: &str,
        nameserver: &str,
    ) -> Result<DelegationPayload, ArinError> {
        self.fetch(
            &format!("/delegation/{name}/nameserver/{nameserver}"),
            None,
            RegistryMethod::Delete,
        )
        .await
    }

    pub async fn delete_delegation_nameservers(
        &self,
        name: &str,
    ) -> Result<DelegationPayload, ArinError> {
        self.fetch(
            &format!("/delegation/{name}/nameservers"),
            None,
            RegistryMethod::Delete,
        )
        .await
    }

    // nets

    pub async fn get_net(&self, handle: &str) -> Result<NetPayload, ArinError> {
        validate_handle(handle)?;
        self.fetch(&format!("/net/{handle}"), None, RegistryMethod::Get)
            .await
    }

    pub async fn delete_net(&self, handle: &str) -> Result<TicketedRequestPayload, ArinError> {
        validate_handle(handle)?;
        self.fetch(&format!("/net/{handle}"), None, RegistryMethod::Delete)
            .await
    }

    pub async fn modify_net(&self, handle: &str, net: &NetPayload) -> Result<NetPayload, ArinError> {
        validate_handle(handle)?;
        net.validate()?;
        self.fetch(
            &format!("/net/{handle}"),
            Some(net.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    /// Delegations covering a net, as the registry's collection document.
    pub async fn get_net_delegations(&self, handle: &str) -> Result<String, ArinError> {
        validate_handle(handle)?;
        self.fetch_text(
            &format!("/net/{handle}/delegations"),
            None,
            RegistryMethod::Get,
        )
        .await
    }

    pub async fn create_recipient_org(
        &self,
        parent_net_handle: &str,
        org: &OrganizationPayload,
    ) -> Result<OrganizationPayload, ArinError> {
        validate_handle(parent_net_handle)?;
        org.validate()?;
        self.fetch(
            &format!("/net/{parent_net_handle}/org"),
            Some(org.to_xml()),
            RegistryMethod::Post,
        )
        .await
    }

    pub async fn create_recipient_customer(
        &self,
        parent_net_handle: &str,
        customer: &CustomerPayload,
    ) -> Result<CustomerPayload, ArinError> {
        validate_handle(parent_net_handle)?;
        customer.validate()?;
        self.fetch(
            &format!("/net/{parent_net_handle}/customer"),
            Some(customer.to_xml()),
            RegistryMethod::Post,
        )
        .await
    }

    pub async fn reassign_net(
        &self,
        parent_net_handle: &str,
        net: &NetPayload,
    ) -> Result<TicketedRequestPayload, ArinError> {
        validate_handle(parent_net_handle)?;
        net.validate()?;
        self.fetch(
            &format!("/net/{parent_net_handle}/reassign"),
            Some(net.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    pub async fn reallocate_net(
        &self,
        parent_net_handle: &str,
        net: &NetPayload,
    ) -> Result<TicketedRequestPayload, ArinError> {
        validate_handle(parent_net_handle)?;
        net.validate()?;
        self.fetch(
            &format!("/net/{parent_net_handle}/reallocate"),
            Some(net.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    // tickets

    pub async fn get_ticket(&self, ticket_no: &str) -> Result<TicketPayload, ArinError> {
        self.fetch(&format!("/ticket/{ticket_no}"), None, RegistryMethod::Get)
            .await
    }

    pub async fn get_ticket_summary(&self, ticket_no: &str) -> Result<TicketPayload, ArinError> {
        self.fetch(
            &format!("/ticket/{ticket_no}/summary"),
            None,
            RegistryMethod::Get,
        )
        .await
    }

    /// Tickets, optionally filtered by type and status.
    pub async fn get_tickets(
        &self,
        ticket_type: Option<&str>,
        status: Option<&str>,
    ) -> Result<String, ArinError> {
        self.fetch_text(&ticket_search("/ticket", ticket_type, status), None, RegistryMethod::Get)
            .await
    }

    pub async fn get_ticket_summaries(
        &self,
        ticket_type: Option<&str>,
        status: Option<&str>,
    ) -> Result<String, ArinError> {
        self.fetch_text(
            &ticket_search("/ticket/summary", ticket_type, status),
            None,
            RegistryMethod::Get,
        )
        .await
    }

    pub async fn modify_ticket(
        &self,
        ticket_no: &str,
        ticket: &TicketPayload,
    ) -> Result<TicketPayload, ArinError> {
        self.fetch(
            &format!("/ticket/{ticket_no}"),
            Some(ticket.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    /// Move a ticket to a new status, e.g. "CLOSED".
    pub async fn modify_ticket_status(
        &self,
        ticket_no: &str,
        status: &str,
    ) -> Result<TicketPayload, ArinError> {
        self.fetch(
            &format!("/ticket/{ticket_no}/ticketStatus/{status}"),
            None,
            RegistryMethod::Put,
        )
        .await
    }

    pub async fn add_ticket_message(
        &self,
        ticket_no: &str,
        message: &MessagePayload,
    ) -> Result<MessagePayload, ArinError> {
        self.fetch(
            &format!("/ticket/{ticket_no}/message"),
            Some(message.to_xml()),
            RegistryMethod::Put,
        )
        .await
    }

    pub async fn get_ticket_message(
        &self,
        ticket_no: &str,
        message_id: &str,
    ) -> Result<MessagePayload, ArinError> {
        self.fetch(
            &format!("/ticket/{ticket_no}/message/{message_id}"),
            None,
            RegistryMethod::Get,
        )
        .await
    }

    /// Raw attachment content.
    pub async fn get_ticket_attachment(
        &self,
        ticket_no: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<Vec<u8>, ArinError> {
        let resource =
            format!("/ticket/{ticket_no}/message/{message_id}/attachment/{attachment_id}");
        let res = self
            .execute(&resource, None, RegistryMethod::Get, AcceptFormat::Xml)
            .await?;
        let bytes = res.bytes().await.map_err(|source| ArinError::Http {
            resource: resource.clone(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}

fn phone_resource(
    handle: &str,
    number: Option<&str>,
    phone_type: Option<PhoneType>,
) -> Result<String, ValidationError> {
    let number = number.map(str::trim).filter(|n| !n.is_empty());
    if number.is_none() && phone_type.is_none() {
        return Err(ValidationError::PhoneSelector);
    }
    let mut resource = format!("/poc/{handle}/phone/{}", number.unwrap_or_default());
    if let Some(t) = phone_type {
        resource.push_str(";type=");
        resource.push_str(t.as_str());
    }
    Ok(resource)
}

fn ticket_search(base: &str, ticket_type: Option<&str>, status: Option<&str>) -> String {
    let mut resource = base.to_string();
    if let Some(t) = ticket_type {
        resource.push_str(";ticketType=");
        resource.push_str(t);
    }
    if let Some(s) = status {
        resource.push_str(";ticketStatus=");
        resource.push_str(s);
    }
    resource
}
