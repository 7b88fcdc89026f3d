/// REST backend for message history and durability
///
/// The session reaches the backend through the `MessageApi` trait so tests
/// can run against an in-memory implementation; `HttpMessageApi` is the
/// real one over reqwest.
use crate::config::Config;
use crate::error::Result;
use crate::messaging_types::{CustomerProfile, Message};
use async_trait::async_trait;

#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Full history for one (customer, admin, shop) conversation,
    /// chronological ascending
    async fn conversation_history(
        &self,
        customer_id: &str,
        admin_id: &str,
        shop_id: &str,
    ) -> Result<Vec<Message>>;

    /// Every message for a shop, across all of its customers
    async fn shop_messages(&self, shop_id: &str) -> Result<Vec<Message>>;

    /// Persist a message; the server assigns id and created_at and
    /// returns the created record
    async fn create_message(&self, message: &Message) -> Result<Message>;

    /// Customer record for display-name resolution
    async fn customer_profile(&self, customer_id: &str) -> Result<CustomerProfile>;
}

/// `MessageApi` over the shop backend's HTTP endpoints
pub struct HttpMessageApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpMessageApi {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MessageApi for HttpMessageApi {
    async fn conversation_history(
        &self,
        customer_id: &str,
        admin_id: &str,
        shop_id: &str,
    ) -> Result<Vec<Message>> {
        let url = format!(
            "{}/messages/conversation/{}/{}/{}",
            self.base_url, customer_id, admin_id, shop_id
        );
        let messages = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(messages)
    }

    async fn shop_messages(&self, shop_id: &str) -> Result<Vec<Message>> {
        let url = format!("{}/messages/shop/{}", self.base_url, shop_id);
        let messages = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(messages)
    }

    async fn create_message(&self, message: &Message) -> Result<Message> {
        let url = format!("{}/messages", self.base_url);
        let created = self
            .http
            .post(&url)
            .json(message)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(created)
    }

    async fn customer_profile(&self, customer_id: &str) -> Result<CustomerProfile> {
        let url = format!("{}/customers/{}", self.base_url, customer_id);
        let profile = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(profile)
    }
}
