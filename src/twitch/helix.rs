use super::base_client::{HttpClient, REQUEST_TIMEOUT};
use super::{ChatService, ModeratedChannel, Session, TwitchUser};
use crate::core::error::BooperError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Helix responses wrap their payload in a `data` array.
#[derive(Deserialize)]
struct DataResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Pagination {
    cursor: Option<String>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    broadcaster_id: &'a str,
    sender_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct SentMessage {
    is_sent: bool,
    #[serde(default)]
    drop_reason: Option<DropReason>,
}

#[derive(Deserialize)]
struct DropReason {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct BanRequest<'a> {
    data: BanData<'a>,
}

#[derive(Serialize)]
struct BanData<'a> {
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

#[derive(Serialize)]
struct BlockedTermRequest<'a> {
    text: &'a str,
}

#[derive(Clone)]
pub struct HelixClient {
    client: HttpClient,
}

impl HelixClient {
    pub fn new(base_url: &str, client_id: String, token: String) -> Result<Self, BooperError> {
        Self::with_timeout(base_url, client_id, token, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        client_id: String,
        token: String,
        timeout: Duration,
    ) -> Result<Self, BooperError> {
        Ok(Self {
            client: HttpClient::new(base_url.to_string(), client_id, token, timeout)?,
        })
    }

    fn moderation_query<'a>(session: &'a Session) -> [(&'static str, &'a str); 2] {
        [
            ("broadcaster_id", session.broadcaster_id()),
            ("moderator_id", session.moderator_id()),
        ]
    }
}

#[async_trait]
impl ChatService for HelixClient {
    async fn send_message(&self, session: &Session, text: &str) -> Result<(), BooperError> {
        let payload = SendMessageRequest {
            broadcaster_id: session.broadcaster_id(),
            sender_id: session.moderator_id(),
            message: text,
        };
        let response: DataResponse<SentMessage> =
            self.client.post("chat/messages", &[], &payload).await?;

        match response.data.first() {
            Some(sent) if sent.is_sent => Ok(()),
            Some(sent) => {
                let reason = sent
                    .drop_reason
                    .as_ref()
                    .map(|r| format!("{} ({})", r.message, r.code))
                    .unwrap_or_else(|| "no reason given".to_string());
                Err(BooperError::Api {
                    status: 200,
                    message: format!("Message was dropped: {}", reason),
                })
            }
            None => Err(BooperError::Api {
                status: 200,
                message: "Empty response from chat/messages".to_string(),
            }),
        }
    }

    async fn ban_user(
        &self,
        session: &Session,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<(), BooperError> {
        let payload = BanRequest {
            data: BanData { user_id, reason },
        };
        let _: serde_json::Value = self
            .client
            .post(
                "moderation/bans",
                &Self::moderation_query(session),
                &payload,
            )
            .await?;
        Ok(())
    }

    async fn block_term(&self, session: &Session, phrase: &str) -> Result<(), BooperError> {
        let payload = BlockedTermRequest { text: phrase };
        let _: serde_json::Value = self
            .client
            .post(
                "moderation/blocked_terms",
                &Self::moderation_query(session),
                &payload,
            )
            .await?;
        Ok(())
    }

    async fn resolve_users(
        &self,
        ids: &[&str],
        logins: &[&str],
    ) -> Result<Vec<TwitchUser>, BooperError> {
        if ids.is_empty() && logins.is_empty() {
            return Ok(Vec::new());
        }

        let query: Vec<(&str, &str)> = ids
            .iter()
            .map(|id| ("id", *id))
            .chain(logins.iter().map(|login| ("login", *login)))
            .collect();
        let response: DataResponse<TwitchUser> = self.client.get("users", &query).await?;
        Ok(response.data)
    }

    async fn moderated_channels(
        &self,
        user_id: &str,
    ) -> Result<Vec<ModeratedChannel>, BooperError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page: DataResponse<ModeratedChannel> = {
                let mut query = vec![("user_id", user_id), ("first", "100")];
                if let Some(after) = cursor.as_deref() {
                    query.push(("after", after));
                }
                self.client.get("moderation/channels", &query).await?
            };
            let fetched = page.data.len();
            channels.extend(page.data);

            cursor = page
                .pagination
                .and_then(|p| p.cursor)
                .filter(|c| !c.is_empty());
            if cursor.is_none() || fetched == 0 {
                break;
            }
        }

        tracing::debug!(count = channels.len(), "fetched moderated channels");
        Ok(channels)
    }
}
