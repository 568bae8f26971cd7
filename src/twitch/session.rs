use super::{ChatService, TwitchUser};
use crate::core::error::BooperError;

/// The channel being moderated and the account doing the moderating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub channel: TwitchUser,
    pub moderator: TwitchUser,
}

/// Identifies an account either by Helix id or by login.
#[derive(Debug, Clone, Copy)]
pub enum UserRef<'a> {
    Id(&'a str),
    Login(&'a str),
}

impl Session {
    pub fn new(channel: TwitchUser, moderator: TwitchUser) -> Self {
        Self { channel, moderator }
    }

    pub fn broadcaster_id(&self) -> &str {
        &self.channel.id
    }

    pub fn moderator_id(&self) -> &str {
        &self.moderator.id
    }

    /// Resolves both accounts through the chat service.
    pub async fn resolve(
        client: &dyn ChatService,
        channel_login: &str,
        moderator: UserRef<'_>,
    ) -> Result<Session, BooperError> {
        let channel_login = channel_login.trim().to_lowercase();
        let channel = resolve_one(client, UserRef::Login(&channel_login))
            .await?
            .ok_or_else(|| BooperError::NotFound(format!("channel '{}'", channel_login)))?;

        let moderator = match moderator {
            UserRef::Login(login) if login.eq_ignore_ascii_case(&channel.login) => {
                channel.clone()
            }
            UserRef::Id(id) if id == channel.id => channel.clone(),
            other => resolve_one(client, other).await?.ok_or_else(|| {
                BooperError::NotFound(match other {
                    UserRef::Id(id) => format!("moderator account with id {}", id),
                    UserRef::Login(login) => format!("moderator account '{}'", login),
                })
            })?,
        };

        tracing::info!(
            channel = %channel.login,
            moderator = %moderator.login,
            "session resolved"
        );
        Ok(Session::new(channel, moderator))
    }
}

/// Resolves a single account, returning `None` when the service knows no such user.
pub async fn resolve_one(
    client: &dyn ChatService,
    user: UserRef<'_>,
) -> Result<Option<TwitchUser>, BooperError> {
    let users = match user {
        UserRef::Id(id) => client.resolve_users(&[id], &[]).await?,
        UserRef::Login(login) => client.resolve_users(&[], &[login]).await?,
    };
    Ok(users.into_iter().next())
}
