//! Container registry digest resolution over the OCI distribution API

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ResolveError;
use crate::scanner::{DigestResolver, ImageRef};

lazy_static! {
    static ref CHALLENGE_PARAM: Regex = Regex::new(r#"(\w+)="([^"]*)""#).unwrap();
}

const DIGEST_HEADER: &str = "docker-content-digest";

/// Manifest types accepted, multi-platform indexes first
const MANIFEST_TYPES: &[&str] = &[
    "application/vnd.oci.image.index.v1+json",
    "application/vnd.docker.distribution.manifest.list.v2+json",
    "application/vnd.oci.image.manifest.v1+json",
    "application/vnd.docker.distribution.manifest.v2+json",
];

/// Resolves image tags to manifest digests with anonymous pulls
pub struct RegistryResolver {
    client: Client,
}

/// Parameters of a `WWW-Authenticate: Bearer` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

impl RegistryResolver {
    /// Create a resolver with its own HTTP client
    pub fn new() -> Result<Self, ResolveError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("frizbee-action/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolveError::Transport {
                url: "registry client".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    async fn manifest_request(
        &self,
        method: Method,
        url: &str,
        token: Option<&str>,
    ) -> Result<Response, ResolveError> {
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, MANIFEST_TYPES.join(", "));
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        request.send().await.map_err(|e| ResolveError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch an anonymous pull token for the challenge
    async fn anonymous_token(
        &self,
        challenge: &BearerChallenge,
        repository: &str,
    ) -> Result<Option<String>, ResolveError> {
        let scope = challenge
            .scope
            .clone()
            .unwrap_or_else(|| format!("repository:{}:pull", repository));
        let mut query = vec![("scope", scope)];
        if let Some(service) = &challenge.service {
            query.push(("service", service.clone()));
        }

        let transport = |e: reqwest::Error| ResolveError::Transport {
            url: challenge.realm.clone(),
            message: e.to_string(),
        };
        let response = self
            .client
            .get(&challenge.realm)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            debug!(realm = %challenge.realm, status = %response.status(), "Token request refused");
            return Ok(None);
        }

        let token: TokenResponse = response.json().await.map_err(transport)?;
        Ok(token.token.or(token.access_token))
    }
}

#[async_trait]
impl DigestResolver for RegistryResolver {
    async fn resolve(&self, image: &ImageRef) -> Result<Option<String>, ResolveError> {
        let registry = image.registry_host().to_string();
        let repository = image.repository();
        let url = manifest_url(&registry, &repository, image.tag_or_latest());

        let mut token = None;
        let mut response = self.manifest_request(Method::HEAD, &url, None).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(challenge) = bearer_challenge(response.headers()) {
                token = self.anonymous_token(&challenge, &repository).await?;
                if token.is_some() {
                    response = self
                        .manifest_request(Method::HEAD, &url, token.as_deref())
                        .await?;
                }
            }
        }

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(ResolveError::Registry {
                    registry,
                    reference: image.to_string(),
                    status: status.as_u16(),
                })
            }
            _ => {}
        }

        if let Some(digest) = digest_header(response.headers()) {
            debug!(image = %image, digest = %digest, "Resolved image");
            return Ok(Some(digest));
        }

        // Some registries only send the digest header on GET
        let response = self
            .manifest_request(Method::GET, &url, token.as_deref())
            .await?;
        if let Some(digest) = digest_header(response.headers()) {
            return Ok(Some(digest));
        }
        if !response.status().is_success() {
            return Err(ResolveError::MissingDigest {
                registry,
                reference: image.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| ResolveError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(Some(format!("sha256:{:x}", Sha256::digest(&body))))
    }
}

fn manifest_url(registry: &str, repository: &str, tag: &str) -> String {
    format!("https://{}/v2/{}/manifests/{}", registry, repository, tag)
}

fn digest_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(DIGEST_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| value.starts_with("sha256:"))
}

fn bearer_challenge(headers: &HeaderMap) -> Option<BearerChallenge> {
    let value = headers.get(WWW_AUTHENTICATE)?.to_str().ok()?;
    parse_bearer_challenge(value)
}

fn parse_bearer_challenge(value: &str) -> Option<BearerChallenge> {
    let (scheme, params) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let mut params: HashMap<String, String> = CHALLENGE_PARAM
        .captures_iter(params)
        .map(|caps| (caps[1].to_lowercase(), caps[2].to_string()))
        .collect();

    Some(BearerChallenge {
        realm: params.remove("realm")?,
        service: params.remove("service"),
        scope: params.remove("scope"),
    })
}
