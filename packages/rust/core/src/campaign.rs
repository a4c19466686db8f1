//! Campaign creation and dispatch.
//!
//! A run owns exactly one campaign, driven through
//! `NotCreated → Created → SendRequested → Sent`. Either request can move it
//! to `Failed` instead; nothing is retried and a failed send never undoes the
//! creation.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use contactsync_remote::{
    BrevoClient, CampaignPayload, CampaignRecipients, is_created, parse_created_id,
};
use contactsync_shared::{CampaignInfo, CampaignState, ContactSyncError, Result, SenderIdentity};

/// Statuses accepted from `sendNow`.
const SEND_OK: [u16; 3] = [200, 202, 204];

/// Everything needed to create the campaign except its target list.
#[derive(Debug, Clone)]
pub struct CampaignDraft {
    pub sender: SenderIdentity,
    pub name: String,
    pub subject: String,
    pub html_content: String,
}

/// `"<prefix> - <unix seconds>"`.
pub fn campaign_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix} - {}", at.timestamp())
}

/// One campaign's lifecycle within a run.
#[derive(Debug, Default)]
pub struct CampaignRun {
    info: CampaignInfo,
}

impl CampaignRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CampaignState {
        self.info.state
    }

    pub fn info(&self) -> &CampaignInfo {
        &self.info
    }

    pub fn into_info(self) -> CampaignInfo {
        self.info
    }

    fn fail(&mut self, status_code: u16, error: String) {
        warn!(status_code, error = %error, from = %self.info.state, "campaign failed");
        self.info.state = CampaignState::Failed;
        self.info.status_code = status_code;
        self.info.error = Some(error);
    }

    /// `NotCreated → Created | Failed`.
    #[instrument(skip_all, fields(name = %draft.name, list_id = list_id))]
    pub async fn create(
        &mut self,
        client: &BrevoClient,
        draft: &CampaignDraft,
        list_id: i64,
    ) -> Result<()> {
        if self.info.state != CampaignState::NotCreated {
            return Err(ContactSyncError::invalid_state(format!(
                "campaign cannot be created from state {}",
                self.info.state
            )));
        }

        let payload = CampaignPayload {
            sender: draft.sender.clone(),
            name: draft.name.clone(),
            subject: draft.subject.clone(),
            html_content: draft.html_content.clone(),
            recipients: CampaignRecipients {
                list_ids: vec![list_id],
            },
        };

        let response = match client.create_campaign(&payload).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(0, e.to_string());
                return Ok(());
            }
        };

        if !is_created(response.status) {
            self.fail(
                response.status,
                format!("API Error: {} - {}", response.status, response.body),
            );
            return Ok(());
        }

        match parse_created_id(&response.body) {
            Ok(id) => {
                self.info.state = CampaignState::Created;
                self.info.campaign_id = Some(id);
                self.info.campaign_name = Some(draft.name.clone());
                self.info.status_code = response.status;
                self.info.message = Some(format!("Campaign '{}' created", draft.name));
                info!(campaign_id = id, "campaign created");
            }
            Err(e) => self.fail(response.status, e.to_string()),
        }
        Ok(())
    }

    /// `Created → SendRequested → Sent | Failed`.
    #[instrument(skip_all, fields(campaign_id = ?self.info.campaign_id))]
    pub async fn send(&mut self, client: &BrevoClient) -> Result<()> {
        let id = match (self.info.state, self.info.campaign_id) {
            (CampaignState::Created, Some(id)) => id,
            (state, _) => {
                return Err(ContactSyncError::invalid_state(format!(
                    "campaign cannot be sent from state {state}"
                )));
            }
        };

        self.info.state = CampaignState::SendRequested;
        let response = match client.send_campaign_now(id).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(0, e.to_string());
                return Ok(());
            }
        };

        if SEND_OK.contains(&response.status) {
            self.info.state = CampaignState::Sent;
            self.info.status_code = response.status;
            self.info.message = Some(format!("Campaign {id} sent to all contacts"));
            info!("campaign sent");
        } else {
            self.fail(
                response.status,
                format!("Send failed: {} - {}", response.status, response.body),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use contactsync_shared::{ApiKey, RemoteSettings};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> BrevoClient {
        client_at(server.uri())
    }

    fn client_at(base_url: String) -> BrevoClient {
        BrevoClient::new(&RemoteSettings {
            base_url,
            api_key: ApiKey::new("test-key"),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn draft() -> CampaignDraft {
        CampaignDraft {
            sender: SenderIdentity {
                name: "Bureau".into(),
                email: "office@example.ge".into(),
            },
            name: "CSV Import Campaign - 1700000000".into(),
            subject: "Hello".into(),
            html_content: "<p>hi</p>".into(),
        }
    }

    #[test]
    fn name_embeds_unix_seconds() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(campaign_name("CSV Import Campaign", at), "CSV Import Campaign - 1700000000");
    }

    #[tokio::test]
    async fn created_then_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emailCampaigns"))
            .and(body_partial_json(serde_json::json!({
                "name": "CSV Import Campaign - 1700000000",
                "recipients": {"listIds": [31]},
                "sender": {"name": "Bureau", "email": "office@example.ge"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 77})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/emailCampaigns/77/sendNow"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let mut run = CampaignRun::new();
        run.create(&client, &draft(), 31).await.unwrap();
        assert_eq!(run.state(), CampaignState::Created);
        run.send(&client).await.unwrap();

        let info = run.into_info();
        assert_eq!(info.state, CampaignState::Sent);
        assert_eq!(info.campaign_id, Some(77));
        assert_eq!(info.status_code, 204);
        assert!(info.error.is_none());
    }

    #[tokio::test]
    async fn creation_rejection_captures_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emailCampaigns"))
            .respond_with(ResponseTemplate::new(400).set_body_string("sender not verified"))
            .mount(&server)
            .await;

        let client = client(&server);
        let mut run = CampaignRun::new();
        run.create(&client, &draft(), 31).await.unwrap();

        assert_eq!(run.state(), CampaignState::Failed);
        assert_eq!(run.info().status_code, 400);
        assert_eq!(
            run.info().error.as_deref(),
            Some("API Error: 400 - sender not verified")
        );

        let err = run.send(&client).await.unwrap_err();
        assert!(matches!(err, ContactSyncError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn creation_without_id_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emailCampaigns"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let mut run = CampaignRun::new();
        run.create(&client(&server), &draft(), 31).await.unwrap();

        assert_eq!(run.state(), CampaignState::Failed);
        assert!(run.info().campaign_id.is_none());
        assert!(run.info().error.as_deref().unwrap().contains("missing id"));
    }

    #[tokio::test]
    async fn send_failure_keeps_campaign_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emailCampaigns"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({"id": 5})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/emailCampaigns/5/sendNow"))
            .respond_with(ResponseTemplate::new(400).set_body_string("list is empty"))
            .mount(&server)
            .await;

        let client = client(&server);
        let mut run = CampaignRun::new();
        run.create(&client, &draft(), 31).await.unwrap();
        run.send(&client).await.unwrap();

        let info = run.into_info();
        assert_eq!(info.state, CampaignState::Failed);
        assert!(info.was_created());
        assert_eq!(info.error.as_deref(), Some("Send failed: 400 - list is empty"));
    }

    #[tokio::test]
    async fn transport_failure_on_create_is_captured() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let client = client_at(format!("http://127.0.0.1:{port}"));

        let mut run = CampaignRun::new();
        run.create(&client, &draft(), 31).await.unwrap();
        assert_eq!(run.state(), CampaignState::Failed);
        assert_eq!(run.info().status_code, 0);
        assert!(run.info().error.as_deref().unwrap().starts_with("transport error"));
    }

    #[tokio::test]
    async fn create_is_not_repeatable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emailCampaigns"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 8})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let mut run = CampaignRun::new();
        run.create(&client, &draft(), 31).await.unwrap();
        let err = run.create(&client, &draft(), 31).await.unwrap_err();
        assert!(matches!(err, ContactSyncError::InvalidState { .. }));
    }
}
