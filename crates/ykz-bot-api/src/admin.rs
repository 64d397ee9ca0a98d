//! [`AdminDirectory`] backed by the bot API.

use async_trait::async_trait;
use ykz_auth::{AdminDirectory, AuthError};

use crate::client::BotApiClient;

#[async_trait]
impl AdminDirectory for BotApiClient {
    async fn is_admin(&self, user_id: &str) -> Result<bool, AuthError> {
        self.admin_status(user_id)
            .await
            .map(|status| status.is_admin)
            .map_err(|e| AuthError::directory_unavailable(e.to_string()))
    }
}
