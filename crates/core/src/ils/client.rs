//! SirsiDynix Symphony Web Services client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::Session;
use crate::config::{IlsConfig, PullListMode};

use super::{
    BibFields, CallFields, HoldRecordFields, IlsApi, IlsError, ItemFields, LoginResponse,
    PatronFields, PullListFields, Record,
};

const SESSION_TOKEN_HEADER: &str = "x-sirs-sessionToken";

/// Fields embedded in a thick pull list.
const THICK_PULL_LIST_FIELDS: &str = "pullList{holdRecord{holdType,status},item{call{bib{title,author,titleControlNumber},callNumber,volumetric},barcode,currentLocation{description}}}";

/// Keys only.
const THIN_PULL_LIST_FIELDS: &str = "pullList{holdRecord,item}";

const HOLD_RECORD_FIELDS: &str = "holdType,status,bib,patron";
const ITEM_FIELDS: &str = "barcode,call,currentLocation{description}";
const BIB_FIELDS: &str = "title,author,titleControlNumber";
const CALL_FIELDS: &str = "callNumber,volumetric,bib";
const PATRON_FIELDS: &str = "barcode,displayName";

/// ILSWS client.
///
/// Static connection settings (base URL, client id, originating app id) are
/// baked into the underlying HTTP client; the session token is passed per
/// call.
pub struct IlswsClient {
    client: Client,
    base_url: String,
}

impl IlswsClient {
    /// Create a new ILSWS client.
    pub fn new(config: &IlsConfig) -> Result<Self, IlsError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "sd-originating-app-id",
            header_value(&config.originating_app_id)?,
        );
        headers.insert("x-sirs-clientID", header_value(&config.client_id)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| IlsError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a keyed record with the given field inclusion.
    async fn get_record<F: DeserializeOwned>(
        &self,
        session: &Session,
        resource: &str,
        key: &str,
        include_fields: &str,
    ) -> Result<Record<F>, IlsError> {
        let url = self.url(&format!("{}/key/{}", resource, urlencoding::encode(key)));
        debug!(resource = resource, key = key, "ILSWS lookup");

        let response = self
            .client
            .get(&url)
            .header(SESSION_TOKEN_HEADER, session.token())
            .query(&[("includeFields", include_fields)])
            .send()
            .await
            .map_err(map_send_error)?;

        parse_json(response).await
    }
}

fn header_value(value: &str) -> Result<HeaderValue, IlsError> {
    HeaderValue::from_str(value)
        .map_err(|e| IlsError::Http(format!("Invalid header value '{}': {}", value, e)))
}

fn map_send_error(e: reqwest::Error) -> IlsError {
    if e.is_timeout() {
        IlsError::Timeout
    } else if e.is_connect() {
        IlsError::ConnectionFailed(e.to_string())
    } else {
        IlsError::Http(e.to_string())
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, IlsError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IlsError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    response
        .json()
        .await
        .map_err(|e| IlsError::ParseError(e.to_string()))
}

#[async_trait]
impl IlsApi for IlswsClient {
    fn name(&self) -> &str {
        "ilsws"
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, IlsError> {
        let url = self.url("rest/security/loginUser");
        debug!(username = username, "ILSWS login");

        let response = self
            .client
            .post(&url)
            .query(&[("login", username), ("password", password)])
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(IlsError::LoginFailed(body.chars().take(200).collect()));
        }

        let login: LoginResponse = parse_json(response).await?;
        Ok(login.session_token)
    }

    async fn hold_item_pull_list(
        &self,
        session: &Session,
        branch_key: &str,
        mode: PullListMode,
    ) -> Result<Record<PullListFields>, IlsError> {
        let include_fields = match mode {
            PullListMode::Thick => THICK_PULL_LIST_FIELDS,
            PullListMode::Thin => THIN_PULL_LIST_FIELDS,
        };
        self.get_record(
            session,
            "circulation/holdItemPullList",
            branch_key,
            include_fields,
        )
        .await
    }

    async fn hold_record(
        &self,
        session: &Session,
        key: &str,
    ) -> Result<Record<HoldRecordFields>, IlsError> {
        self.get_record(session, "circulation/holdRecord", key, HOLD_RECORD_FIELDS)
            .await
    }

    async fn item(&self, session: &Session, key: &str) -> Result<Record<ItemFields>, IlsError> {
        self.get_record(session, "catalog/item", key, ITEM_FIELDS)
            .await
    }

    async fn bib(&self, session: &Session, key: &str) -> Result<Record<BibFields>, IlsError> {
        self.get_record(session, "catalog/bib", key, BIB_FIELDS).await
    }

    async fn call(&self, session: &Session, key: &str) -> Result<Record<CallFields>, IlsError> {
        self.get_record(session, "catalog/call", key, CALL_FIELDS)
            .await
    }

    async fn patron(
        &self,
        session: &Session,
        key: &str,
    ) -> Result<Record<PatronFields>, IlsError> {
        self.get_record(session, "user/patron", key, PATRON_FIELDS)
            .await
    }
}
