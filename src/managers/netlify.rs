use crate::config::Config;
use crate::constants::limits::LOG_SUBSTRING_LENGTH;
use crate::constants::netlify::{OAUTH_SCOPE, SITES_PATH, TOKEN_PATH};
use crate::errors::GatewayError;
use crate::services::logger::Logger;
use crate::utils::text::preview;
use base64::Engine;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub netlify_access_token: Option<String>,
    pub netlify_site_id: Option<String>,
    pub zip_contents: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn not_configured(what: &str) -> GatewayError {
    GatewayError::internal(format!("Netlify {} is not configured", what))
}

/// Accepts raw base64 as well as a `data:...;base64,` URL.
pub fn decode_archive(encoded: &str) -> Result<Vec<u8>, GatewayError> {
    let payload = match encoded.find("base64,") {
        Some(idx) if encoded.starts_with("data:") => &encoded[idx + "base64,".len()..],
        _ => encoded,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| {
            GatewayError::invalid_params("zipContents must be valid base64")
                .with_hint(err.to_string())
        })
}

/// Netlify OAuth (authorize + callback) and zip deploys.
#[derive(Clone)]
pub struct NetlifyManager {
    logger: Logger,
    config: Arc<Config>,
    client: Client,
}

impl NetlifyManager {
    pub fn new(logger: Logger, config: Arc<Config>, client: Client) -> Self {
        Self {
            logger: logger.child("netlify"),
            config,
            client,
        }
    }

    pub fn authorize_url(&self, state: Option<&str>) -> Result<String, GatewayError> {
        let netlify = &self.config.netlify;
        let client_id =
            non_empty(netlify.client_id.as_deref()).ok_or_else(|| not_configured("OAuth client"))?;
        let mut url = Url::parse(&netlify.authorize_url)
            .map_err(|_| not_configured("authorize URL"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("response_type", "code")
                .append_pair("scope", OAUTH_SCOPE)
                .append_pair("client_id", client_id);
            if let Some(redirect) = non_empty(netlify.redirect_uri.as_deref()) {
                pairs.append_pair("redirect_uri", redirect);
            }
            if let Some(state) = non_empty(state) {
                pairs.append_pair("state", state);
            }
        }
        Ok(url.to_string())
    }

    fn landing_url(&self, params: &[(&str, &str)]) -> Result<String, GatewayError> {
        let mut url = Url::parse(&self.config.netlify.post_auth_redirect)
            .map_err(|_| not_configured("post-auth redirect"))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url.to_string())
    }

    /// Returns the `Location` to redirect the browser to.
    pub async fn callback(&self, query: &CallbackQuery) -> Result<String, GatewayError> {
        if let Some(error) = non_empty(query.error.as_deref()) {
            self.logger.warn(
                "OAuth provider returned an error",
                Some(&serde_json::json!({ "error": error })),
            );
            return Err(GatewayError::invalid_params(format!("OAuth Error: {}", error))
                .with_details(serde_json::json!({ "oauthError": error })));
        }
        let code = non_empty(query.code.as_deref())
            .ok_or_else(|| GatewayError::invalid_params("Missing authorization code"))?;

        let netlify = &self.config.netlify;
        let (Some(client_id), Some(client_secret), Some(redirect_uri)) = (
            non_empty(netlify.client_id.as_deref()),
            non_empty(netlify.client_secret.as_deref()),
            non_empty(netlify.redirect_uri.as_deref()),
        ) else {
            return Err(not_configured("OAuth client"));
        };

        let state = non_empty(query.state.as_deref());
        match self
            .exchange_code(code, client_id, client_secret, redirect_uri)
            .await
        {
            Ok(access_token) => {
                self.logger.info("Netlify token exchange succeeded", None);
                let mut params = vec![
                    ("auth", "success"),
                    ("provider", "netlify"),
                    ("access_token", access_token.as_str()),
                ];
                if let Some(state) = state {
                    params.push(("state", state));
                }
                self.landing_url(&params)
            }
            Err(err) => {
                self.logger.warn(
                    "Netlify token exchange failed",
                    Some(&serde_json::json!({ "error": err.message, "details": err.details })),
                );
                self.landing_url(&[
                    ("auth", "error"),
                    ("provider", "netlify"),
                    ("error", "token_exchange_failed"),
                ])
            }
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
    ) -> Result<String, GatewayError> {
        let token_url = format!(
            "{}{}",
            self.config.netlify.api_base.trim_end_matches('/'),
            TOKEN_PATH
        );
        let form = serde_urlencoded::to_string([
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", redirect_uri),
        ])
        .map_err(|err| GatewayError::internal(format!("Failed to encode token request: {}", err)))?;
        let response = self
            .client
            .post(&token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::upstream(format!(
                "Token exchange failed: {}",
                status.as_u16()
            ))
            .with_details(serde_json::json!({
                "body": preview(&body, LOG_SUBSTRING_LENGTH),
            })));
        }
        serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("access_token").and_then(Value::as_str).map(str::to_string))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::upstream("Token response did not include an access_token"))
    }

    async fn load_archive(&self, request: &DeployRequest) -> Result<Vec<u8>, GatewayError> {
        if let Some(encoded) = non_empty(request.zip_contents.as_deref()) {
            return decode_archive(encoded);
        }
        let path = self
            .config
            .netlify
            .default_zip
            .as_ref()
            .ok_or_else(|| not_configured("default deploy archive"))?;
        tokio::fs::read(path).await.map_err(|err| {
            GatewayError::internal("Failed to read default deploy archive").with_details(
                serde_json::json!({ "path": path.display().to_string(), "details": err.to_string() }),
            )
        })
    }

    /// Relays a failed Netlify call as 502 with its status and body.
    async fn upstream_failure(&self, action: &str, response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        self.logger.warn(
            "Netlify API error",
            Some(&serde_json::json!({
                "action": action,
                "status": status,
                "body": preview(&body, LOG_SUBSTRING_LENGTH),
            })),
        );
        GatewayError::upstream(format!("Error {} on Netlify", action)).with_details(
            serde_json::json!({ "upstreamStatus": status, "upstreamBody": body }),
        )
    }

    pub async fn deploy(&self, target: &str, body: &Bytes) -> Result<Value, GatewayError> {
        let request: DeployRequest = serde_json::from_slice(body)?;
        let token = non_empty(request.netlify_access_token.as_deref())
            .ok_or_else(|| GatewayError::invalid_params("No access token provided"))?;
        let archive = self.load_archive(&request).await?;
        let api_base = self.config.netlify.api_base.trim_end_matches('/').to_string();

        let mut created_site: Option<Value> = None;
        let site_id = match non_empty(request.netlify_site_id.as_deref()) {
            Some(id) => id.to_string(),
            None => {
                let response = self
                    .client
                    .post(format!("{}{}", api_base, SITES_PATH))
                    .bearer_auth(token)
                    .json(&serde_json::json!({}))
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(self.upstream_failure("creating site", response).await);
                }
                let site: Value = response.json().await?;
                let id = site
                    .get("site_id")
                    .or_else(|| site.get("id"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| GatewayError::upstream("Netlify site response had no id"))?;
                self.logger.info(
                    "Created Netlify site",
                    Some(&serde_json::json!({ "siteId": id, "target": target })),
                );
                created_site = Some(site);
                id
            }
        };

        let response = self
            .client
            .post(format!("{}{}/{}/deploys", api_base, SITES_PATH, site_id))
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/zip")
            .body(archive)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(self.upstream_failure("uploading zip", response).await);
        }
        let deploy: Value = response.json().await.unwrap_or(Value::Null);
        self.logger.info(
            "Uploaded deploy",
            Some(&serde_json::json!({ "siteId": site_id, "target": target, "deployId": deploy.get("id") })),
        );

        let mut out = serde_json::json!({ "success": true, "siteId": site_id });
        if let Value::Object(map) = &mut out {
            for (field, key) in [("deployId", "id"), ("state", "state")] {
                if let Some(value) = deploy.get(key).filter(|v| !v.is_null()) {
                    map.insert(field.to_string(), value.clone());
                }
            }
            if let Some(url) = ["ssl_url", "deploy_ssl_url", "url"]
                .iter()
                .find_map(|k| deploy.get(*k).filter(|v| v.is_string()))
            {
                map.insert("url".to_string(), url.clone());
            }
            if let Some(site) = created_site {
                map.insert("site".to_string(), site);
            }
        }
        Ok(out)
    }
}
