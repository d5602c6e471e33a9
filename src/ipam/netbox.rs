use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{Aggregate, Ipam, IpamError, NetAssignment, Prefix, RirFields, Site};
use crate::config::NetboxConfig;

/// One page of a NetBox list endpoint.
#[derive(Debug, Deserialize)]
struct Page<T> {
    next: Option<String>,
    results: Vec<T>,
}

#[derive(Clone)]
pub struct NetboxClient {
    http: Client,
    config: NetboxConfig,
}

impl NetboxClient {
    pub fn new(config: NetboxConfig) -> Result<Self, IpamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {}", config.token))
                .map_err(|_| IpamError::InvalidToken)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| IpamError::Http {
                path: config.base_url.clone(),
                source,
            })?;
        Ok(Self { http, config })
    }

    async fn check(path: &str, res: Response) -> Result<Response, IpamError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(IpamError::Status {
            path: path.to_string(),
            status,
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, IpamError> {
        debug!(url, "netbox request");
        let http_err = |source| IpamError::Http {
            path: url.to_string(),
            source,
        };
        let res = self.http.get(url).send().await.map_err(http_err)?;
        Self::check(url, res).await?.json::<T>().await.map_err(http_err)
    }

    async fn get_object<T: DeserializeOwned>(
        &self,
        path: &str,
        kind: &'static str,
        id: u64,
    ) -> Result<T, IpamError> {
        match self.get_json(&self.config.api_url(path)).await {
            Err(IpamError::Status { status: 404, .. }) => Err(IpamError::NotFound {
                kind,
                id: id.to_string(),
            }),
            other => other,
        }
    }

    /// Walk a list endpoint until `next` runs out.
    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, IpamError> {
        let mut url = Some(self.config.api_url(path));
        let mut items = Vec::new();
        while let Some(current) = url {
            let page: Page<T> = self.get_json(&current).await?;
            items.extend(page.results);
            url = page.next;
        }
        Ok(items)
    }
}

#[async_trait]
impl Ipam for NetboxClient {
    async fn prefix(&self, id: u64) -> Result<Prefix, IpamError> {
        self.get_object(&format!("ipam/prefixes/{id}/"), "prefix", id)
            .await
    }

    async fn aggregate(&self, id: u64) -> Result<Aggregate, IpamError> {
        self.get_object(&format!("ipam/aggregates/{id}/"), "aggregate", id)
            .await
    }

    async fn aggregates(&self) -> Result<Vec<Aggregate>, IpamError> {
        self.list("ipam/aggregates/?limit=100").await
    }

    async fn aggregate_containing(&self, prefix: &str) -> Result<Option<Aggregate>, IpamError> {
        let found: Vec<Aggregate> = self
            .list(&format!("ipam/aggregates/?q={prefix}"))
            .await?;
        Ok(found.into_iter().next())
    }

    async fn prefixes_within(&self, aggregate: &Aggregate) -> Result<Vec<Prefix>, IpamError> {
        self.list(&format!(
            "ipam/prefixes/?within_include={}&limit=100",
            aggregate.prefix
        ))
        .await
    }

    async fn site(&self, id: u64) -> Result<Site, IpamError> {
        self.get_object(&format!("dcim/sites/{id}/"), "site", id)
            .await
    }

    async fn record_assignment(
        &self,
        prefix_id: u64,
        assignment: &NetAssignment,
    ) -> Result<(), IpamError> {
        let url = self.config.api_url(&format!("ipam/prefixes/{prefix_id}/"));
        debug!(prefix_id, handle = %assignment.handle, "recording registry assignment");
        let body = json!({ "custom_fields": RirFields::from(assignment) });
        let res = self
            .http
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| IpamError::Http {
                path: url.clone(),
                source,
            })?;
        Self::check(&url, res).await?;
        Ok(())
    }
}
