pub mod base_client;
pub mod helix;
pub mod session;

use crate::core::error::BooperError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use helix::HelixClient;
pub use session::Session;

/// A Twitch account as returned by the users endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchUser {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub display_name: String,
}

/// A channel the moderator account has moderation rights in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratedChannel {
    pub broadcaster_id: String,
    pub broadcaster_login: String,
    #[serde(default)]
    pub broadcaster_name: String,
}

/// Operations the dispatcher needs from the chat service.
///
/// Every call reports its own failure; callers decide whether a failure
/// is surfaced or swallowed.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send_message(&self, session: &Session, text: &str) -> Result<(), BooperError>;

    async fn ban_user(
        &self,
        session: &Session,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<(), BooperError>;

    async fn block_term(&self, session: &Session, phrase: &str) -> Result<(), BooperError>;

    /// Looks up accounts by id and/or login. Unknown names are simply absent
    /// from the result.
    async fn resolve_users(
        &self,
        ids: &[&str],
        logins: &[&str],
    ) -> Result<Vec<TwitchUser>, BooperError>;

    async fn moderated_channels(&self, user_id: &str)
    -> Result<Vec<ModeratedChannel>, BooperError>;
}

/// Channels `moderator` can dispatch to: their own first, then every
/// moderated channel ordered by login.
pub async fn list_channels(
    client: &dyn ChatService,
    moderator: &TwitchUser,
) -> Result<Vec<String>, BooperError> {
    let mut moderated = client.moderated_channels(&moderator.id).await?;
    moderated.sort_by(|a, b| a.broadcaster_login.cmp(&b.broadcaster_login));

    let mut channels = vec![moderator.login.clone()];
    for channel in moderated {
        if !channels.contains(&channel.broadcaster_login) {
            channels.push(channel.broadcaster_login);
        }
    }
    Ok(channels)
}
