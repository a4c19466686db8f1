//! Authenticated HTTP client for the Brevo v3 API.
//!
//! Every call is one request with the client-wide timeout. Methods whose
//! callers only care about success return typed values and map any
//! non-success status to [`ContactSyncError::Remote`]. The upsert and campaign
//! calls hand back the [`RawResponse`] because their callers branch on the
//! status and body.

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use contactsync_shared::{ContactSyncError, RemoteSettings, Result};

use crate::models::{
    CampaignPayload, ContactsPage, CreateFolderRequest, CreateListRequest, FoldersPage,
    RawResponse, UpsertPayload, parse_created_id,
};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("contactsync/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
const API_KEY_HEADER: &str = "api-key";

/// Client for the contact, folder, list and campaign endpoints.
#[derive(Debug, Clone)]
pub struct BrevoClient {
    http: Client,
    base_url: String,
}

impl BrevoClient {
    /// Build a client from resolved settings.
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(settings.api_key.expose())
            .map_err(|_| ContactSyncError::config("API key contains invalid header characters"))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ContactSyncError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send one request and read the whole body.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<RawResponse> {
        let url = self.url(path);
        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ContactSyncError::Transport(format!("{method} {url}: {e}")))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ContactSyncError::Transport(format!("{method} {url}: failed to read body: {e}"))
        })?;

        debug!(%method, %url, status, body = %body, "api response");

        Ok(RawResponse { status, body })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.execute::<()>(Method::GET, path, query, None).await?;
        if response.status != StatusCode::OK.as_u16() {
            return Err(ContactSyncError::remote(response.status, response.body));
        }
        serde_json::from_str(&response.body)
            .map_err(|e| ContactSyncError::decode(format!("GET {path}: {e}")))
    }

    /// Post a creation request and return the new resource id.
    async fn create<B: Serialize>(&self, path: &str, body: &B) -> Result<i64> {
        let response = self.execute(Method::POST, path, &[], Some(body)).await?;
        if !is_created(response.status) {
            return Err(ContactSyncError::remote(response.status, response.body));
        }
        parse_created_id(&response.body)
    }

    /// `GET /contacts?limit=&offset=`.
    #[instrument(skip(self))]
    pub async fn list_contacts(&self, limit: usize, offset: usize) -> Result<ContactsPage> {
        self.get_json(
            "contacts",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
    }

    /// `POST /contacts`. Returns whatever the service answered.
    #[instrument(skip_all, fields(email = %payload.email))]
    pub async fn upsert_contact(&self, payload: &UpsertPayload) -> Result<RawResponse> {
        self.execute(Method::POST, "contacts", &[], Some(payload))
            .await
    }

    /// `GET /contacts/folders?limit=&offset=`.
    #[instrument(skip(self))]
    pub async fn list_folders(&self, limit: usize, offset: usize) -> Result<FoldersPage> {
        self.get_json(
            "contacts/folders",
            &[("limit", limit.to_string()), ("offset", offset.to_string())],
        )
        .await
    }

    /// `POST /contacts/folders`. Returns the new folder id (always > 0).
    #[instrument(skip(self))]
    pub async fn create_folder(&self, name: &str) -> Result<i64> {
        self.create("contacts/folders", &CreateFolderRequest { name })
            .await
    }

    /// `POST /contacts/lists`. Returns the new list id (always > 0).
    #[instrument(skip(self))]
    pub async fn create_list(&self, name: &str, folder_id: i64) -> Result<i64> {
        self.create("contacts/lists", &CreateListRequest { name, folder_id })
            .await
    }

    /// `POST /emailCampaigns`. Returns whatever the service answered.
    #[instrument(skip_all, fields(name = %payload.name))]
    pub async fn create_campaign(&self, payload: &CampaignPayload) -> Result<RawResponse> {
        self.execute(Method::POST, "emailCampaigns", &[], Some(payload))
            .await
    }

    /// `POST /emailCampaigns/{id}/sendNow`. Returns whatever the service answered.
    #[instrument(skip(self))]
    pub async fn send_campaign_now(&self, campaign_id: i64) -> Result<RawResponse> {
        self.execute::<()>(
            Method::POST,
            &format!("emailCampaigns/{campaign_id}/sendNow"),
            &[],
            None,
        )
        .await
    }
}

/// Statuses the service uses to acknowledge a creation.
pub fn is_created(status: u16) -> bool {
    status == StatusCode::CREATED.as_u16() || status == StatusCode::ACCEPTED.as_u16()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use contactsync_shared::ApiKey;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::models::AttributeMap;

    fn settings(base_url: String) -> RemoteSettings {
        RemoteSettings {
            base_url,
            api_key: ApiKey::new("test-key"),
            timeout: Duration::from_secs(5),
        }
    }

    /// An address nothing listens on.
    fn closed_port_uri() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    #[tokio::test]
    async fn list_contacts_sends_key_and_paging() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contacts"))
            .and(header("api-key", "test-key"))
            .and(header("accept", "application/json"))
            .and(query_param("limit", "1000"))
            .and(query_param("offset", "2000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "contacts": [{"id": 1, "email": "A@Example.com"}, {"id": 2}],
                "count": 2002
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BrevoClient::new(&settings(server.uri())).unwrap();
        let page = client.list_contacts(1000, 2000).await.unwrap();

        assert_eq!(page.count, 2002);
        assert_eq!(page.contacts.len(), 2);
        assert_eq!(page.contacts[0].email.as_deref(), Some("A@Example.com"));
        assert!(page.contacts[1].email.is_none());
    }

    #[tokio::test]
    async fn list_contacts_maps_status_and_decode_failures() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contacts"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/contacts"))
            .and(query_param("offset", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = BrevoClient::new(&settings(server.uri())).unwrap();

        let err = client.list_contacts(10, 0).await.unwrap_err();
        assert_eq!(err.status(), Some(401));

        let err = client.list_contacts(10, 10).await.unwrap_err();
        assert!(matches!(err, ContactSyncError::Decode { .. }));
    }

    #[tokio::test]
    async fn upsert_returns_raw_response() {
        let server = MockServer::start().await;

        let mut attributes = AttributeMap::new();
        attributes.insert("COMPANY_NAME".into(), "Acme".into());
        let payload = UpsertPayload::new("a@example.com", attributes, vec![5]);

        Mock::given(method("POST"))
            .and(path("/contacts"))
            .and(body_json(serde_json::json!({
                "email": "a@example.com",
                "updateEnabled": true,
                "attributes": {"COMPANY_NAME": "Acme"},
                "listIds": [5]
            })))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
            .expect(1)
            .mount(&server)
            .await;

        let client = BrevoClient::new(&settings(server.uri())).unwrap();
        let response = client.upsert_contact(&payload).await.unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(response.body, "bad");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn create_folder_and_list_return_ids() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/contacts/folders"))
            .and(body_json(serde_json::json!({"name": "Winners"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 3})))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/contacts/lists"))
            .and(body_json(serde_json::json!({"name": "Winners List - x", "folderId": 3})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 44})))
            .mount(&server)
            .await;

        let client = BrevoClient::new(&settings(server.uri())).unwrap();
        assert_eq!(client.create_folder("Winners").await.unwrap(), 3);
        assert_eq!(client.create_list("Winners List - x", 3).await.unwrap(), 44);
    }

    #[tokio::test]
    async fn create_rejects_bad_status_and_bad_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/contacts/folders"))
            .respond_with(ResponseTemplate::new(400).set_body_string("duplicate"))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/contacts/lists"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": -1})))
            .mount(&server)
            .await;

        let client = BrevoClient::new(&settings(server.uri())).unwrap();

        let err = client.create_folder("Winners").await.unwrap_err();
        assert_eq!(err.status(), Some(400));

        let err = client.create_list("l", 1).await.unwrap_err();
        assert!(matches!(err, ContactSyncError::Validation { .. }));
    }

    #[tokio::test]
    async fn send_campaign_targets_campaign_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/emailCampaigns/91/sendNow"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = BrevoClient::new(&settings(server.uri())).unwrap();
        let response = client.send_campaign_now(91).await.unwrap();
        assert_eq!(response.status, 204);
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let client = BrevoClient::new(&settings(closed_port_uri())).unwrap();
        let err = client.list_contacts(10, 0).await.unwrap_err();
        assert!(matches!(err, ContactSyncError::Transport(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out_as_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contacts/folders"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"folders": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut s = settings(server.uri());
        s.timeout = Duration::from_millis(100);
        let client = BrevoClient::new(&s).unwrap();

        let err = client.list_folders(50, 0).await.unwrap_err();
        assert!(matches!(err, ContactSyncError::Transport(_)));
    }

    #[test]
    fn created_statuses() {
        assert!(is_created(201));
        assert!(is_created(202));
        assert!(!is_created(200));
        assert!(!is_created(204));
    }
}
