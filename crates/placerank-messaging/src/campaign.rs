//! Campaign state machine: `Pending → EnsuringFriends → Sending → Done`,
//! with `Failed` reachable from every non-terminal state.
//!
//! The friend-add step finishes when the backend reports the request as
//! completed, not after a fixed delay.

use std::future::Future;
use std::time::Duration;

use placerank_core::AppConfig;
use serde::{Deserialize, Serialize};

use crate::error::MessagingError;
use crate::plan::{CampaignPlan, ContactId};
use crate::retry::RetryPolicy;
use crate::template::RenderOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    Pending,
    EnsuringFriends,
    Sending,
    Done,
    Failed,
}

impl std::fmt::Display for CampaignState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignState::Pending => write!(f, "pending"),
            CampaignState::EnsuringFriends => write!(f, "ensuring-friends"),
            CampaignState::Sending => write!(f, "sending"),
            CampaignState::Done => write!(f, "done"),
            CampaignState::Failed => write!(f, "failed"),
        }
    }
}

impl CampaignState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignState::Done | CampaignState::Failed)
    }

    #[must_use]
    pub fn can_advance_to(self, next: CampaignState) -> bool {
        use CampaignState::{Done, EnsuringFriends, Failed, Pending, Sending};
        matches!(
            (self, next),
            (Pending, EnsuringFriends) | (EnsuringFriends, Sending) | (Sending, Done)
        ) || (next == Failed && !self.is_terminal())
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::InvalidTransition`] for any move the state
    /// machine does not allow.
    pub fn advance(self, next: CampaignState) -> Result<CampaignState, MessagingError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(MessagingError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Handle for an asynchronous friend-add request on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FriendRequestTicket(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FriendRequestStatus {
    Pending,
    Completed {
        /// Contacts that could not be added as friends; they are skipped.
        #[serde(default)]
        failed: Vec<ContactId>,
    },
}

/// Operations the campaign runner needs from the messaging backend.
pub trait MessagingBackend {
    fn ensure_friends(
        &self,
        contacts: &[ContactId],
    ) -> impl Future<Output = Result<FriendRequestTicket, MessagingError>> + Send;

    fn friend_request_status(
        &self,
        ticket: &FriendRequestTicket,
    ) -> impl Future<Output = Result<FriendRequestStatus, MessagingError>> + Send;

    fn send_message(
        &self,
        contact: &ContactId,
        parts: &[String],
    ) -> impl Future<Output = Result<(), MessagingError>> + Send;
}

#[derive(Debug, Clone)]
pub struct CampaignSettings {
    pub poll_interval: Duration,
    pub friend_confirm_timeout: Duration,
    pub retry: RetryPolicy,
    pub render: RenderOptions,
}

impl CampaignSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.friend_poll_interval_ms),
            friend_confirm_timeout: Duration::from_secs(config.friend_confirm_timeout_secs),
            retry: RetryPolicy::from_app_config(config),
            render: RenderOptions {
                name_max_chars: config.name_max_chars,
                ..RenderOptions::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendFailure {
    pub contact: ContactId,
    pub reason: String,
}

/// Outcome of a campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignReport {
    pub state: CampaignState,
    /// Every state the campaign entered, starting with `Pending`.
    pub history: Vec<CampaignState>,
    pub sent: Vec<ContactId>,
    pub friend_failures: Vec<ContactId>,
    pub send_failures: Vec<SendFailure>,
    /// Why the campaign ended in `Failed`.
    pub failure: Option<String>,
}

impl CampaignReport {
    fn new() -> Self {
        Self {
            state: CampaignState::Pending,
            history: vec![CampaignState::Pending],
            sent: Vec::new(),
            friend_failures: Vec::new(),
            send_failures: Vec::new(),
            failure: None,
        }
    }

    fn enter(&mut self, next: CampaignState) -> Result<(), MessagingError> {
        self.state = self.state.advance(next)?;
        self.history.push(next);
        tracing::info!(state = %next, "campaign state changed");
        Ok(())
    }

    fn fail(&mut self, reason: String) -> Result<(), MessagingError> {
        tracing::error!(state = %self.state, reason = %reason, "campaign failed");
        self.enter(CampaignState::Failed)?;
        self.failure = Some(reason);
        Ok(())
    }
}

/// Run a campaign to completion against `backend`.
///
/// Orchestration failures (friend step rejected or never confirmed) end the
/// campaign in [`CampaignState::Failed`] and are reported in the returned
/// [`CampaignReport`]. A failed send to one contact is recorded and the run
/// continues with the next contact.
///
/// # Errors
///
/// Returns [`MessagingError::InvalidPlan`] if the plan fails validation; no
/// backend call is made in that case.
pub async fn run_campaign<B>(
    backend: &B,
    plan: &CampaignPlan,
    settings: &CampaignSettings,
) -> Result<CampaignReport, MessagingError>
where
    B: MessagingBackend,
{
    plan.validate()?;
    let mut report = CampaignReport::new();
    let contact_ids: Vec<ContactId> = plan.contacts.iter().map(|c| c.id.clone()).collect();

    report.enter(CampaignState::EnsuringFriends)?;
    if !contact_ids.is_empty() {
        match ensure_friends_confirmed(backend, &contact_ids, settings).await {
            Ok(failed) => {
                if !failed.is_empty() {
                    tracing::warn!(
                        failed = failed.len(),
                        "some contacts could not be added as friends; skipping them"
                    );
                }
                report.friend_failures = failed;
            }
            Err(reason) => {
                report.fail(reason)?;
                return Ok(report);
            }
        }
    }

    report.enter(CampaignState::Sending)?;
    for contact in &plan.contacts {
        if report.friend_failures.contains(&contact.id) {
            continue;
        }
        let parts = plan.template.render(contact, &settings.render);
        let result = settings
            .retry
            .run("send_message", || backend.send_message(&contact.id, &parts))
            .await;
        match result {
            Ok(()) => {
                tracing::debug!(contact = %contact.id, parts = parts.len(), "message sent");
                report.sent.push(contact.id.clone());
            }
            Err(e) => {
                tracing::warn!(contact = %contact.id, error = %e, "message send failed");
                report.send_failures.push(SendFailure {
                    contact: contact.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report.enter(CampaignState::Done)?;
    tracing::info!(
        sent = report.sent.len(),
        send_failures = report.send_failures.len(),
        friend_failures = report.friend_failures.len(),
        "campaign finished"
    );
    Ok(report)
}

/// Request friend adds and poll until the backend confirms them.
///
/// Returns the contacts the backend could not add, or a failure reason.
async fn ensure_friends_confirmed<B>(
    backend: &B,
    contacts: &[ContactId],
    settings: &CampaignSettings,
) -> Result<Vec<ContactId>, String>
where
    B: MessagingBackend,
{
    let ticket = settings
        .retry
        .run("ensure_friends", || backend.ensure_friends(contacts))
        .await
    .map_err(|e| format!("friend request rejected: {e}"))?;

    let deadline = tokio::time::Instant::now() + settings.friend_confirm_timeout;
    loop {
        let status = settings
            .retry
            .run("friend_request_status", || {
                backend.friend_request_status(&ticket)
            })
            .await
        .map_err(|e| format!("friend request status unavailable: {e}"))?;

        match status {
            FriendRequestStatus::Completed { failed } => return Ok(failed),
            FriendRequestStatus::Pending => {
                if tokio::time::Instant::now() >= deadline {
                    return Err(format!(
                        "friend request {} not confirmed within {}s",
                        ticket.0,
                        settings.friend_confirm_timeout.as_secs_f64()
                    ));
                }
                tracing::debug!(ticket = %ticket.0, "friend request still pending");
                tokio::time::sleep(settings.poll_interval).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "campaign_test.rs"]
mod tests;
