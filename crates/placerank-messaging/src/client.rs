//! HTTP implementation of [`MessagingBackend`] against the dashboard's
//! `/api/kakao/*` endpoints.

use std::time::Duration;

use placerank_core::AppConfig;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::campaign::{FriendRequestStatus, FriendRequestTicket, MessagingBackend};
use crate::error::MessagingError;
use crate::plan::ContactId;

pub struct HttpMessagingBackend {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

#[derive(Serialize)]
struct EnsureFriendsRequest<'a> {
    contact_ids: &'a [ContactId],
}

#[derive(Deserialize)]
struct EnsureFriendsResponse {
    ticket: FriendRequestTicket,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    contact_id: &'a ContactId,
    parts: &'a [String],
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpMessagingBackend {
    /// Creates a backend client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MessagingError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_token: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, MessagingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("placerank/0.1 (messaging)")
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| MessagingError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_token: api_token.map(str::to_owned),
        })
    }

    /// Creates a backend client from `PLACERANK_API_*` settings.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::InvalidBaseUrl`] when no base URL is
    /// configured, or any error from [`HttpMessagingBackend::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, MessagingError> {
        let base_url = config
            .api_base_url
            .as_deref()
            .ok_or_else(|| MessagingError::InvalidBaseUrl {
                url: String::new(),
                reason: "PLACERANK_API_BASE_URL is not set".to_owned(),
            })?;
        Self::new(
            base_url,
            config.api_token.as_deref(),
            config.http_timeout_secs,
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, MessagingError> {
        self.base_url
            .join(path)
            .map_err(|e| MessagingError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends the request, maps non-2xx statuses to [`MessagingError::Api`],
    /// and returns the raw body.
    async fn execute(&self, request: RequestBuilder, context: &str) -> Result<String, MessagingError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| format!("{context} failed"));
        Err(MessagingError::Api {
            status: status.as_u16(),
            message,
        })
    }

    fn decode<T: for<'de> Deserialize<'de>>(body: &str, context: &str) -> Result<T, MessagingError> {
        serde_json::from_str(body).map_err(|e| MessagingError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

impl MessagingBackend for HttpMessagingBackend {
    async fn ensure_friends(
        &self,
        contacts: &[ContactId],
    ) -> Result<FriendRequestTicket, MessagingError> {
        let url = self.endpoint("api/kakao/friends/ensure")?;
        let request = self.client.post(url).json(&EnsureFriendsRequest {
            contact_ids: contacts,
        });
        let body = self.execute(request, "ensure_friends").await?;
        let parsed: EnsureFriendsResponse = Self::decode(&body, "ensure_friends")?;
        tracing::debug!(ticket = %parsed.ticket.0, contacts = contacts.len(), "friend request submitted");
        Ok(parsed.ticket)
    }

    async fn friend_request_status(
        &self,
        ticket: &FriendRequestTicket,
    ) -> Result<FriendRequestStatus, MessagingError> {
        let mut url = self.endpoint("api/kakao/friends/requests")?;
        url.path_segments_mut()
            .map_err(|()| MessagingError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "base URL cannot have path segments".to_owned(),
            })?
            .push(&ticket.0);
        let body = self
            .execute(self.client.get(url), "friend_request_status")
            .await?;
        Self::decode(&body, &format!("friend_request_status({})", ticket.0))
    }

    async fn send_message(&self, contact: &ContactId, parts: &[String]) -> Result<(), MessagingError> {
        let url = self.endpoint("api/kakao/messages")?;
        let request = self.client.post(url).json(&SendMessageRequest {
            contact_id: contact,
            parts,
        });
        self.execute(request, "send_message").await?;
        Ok(())
    }
}
