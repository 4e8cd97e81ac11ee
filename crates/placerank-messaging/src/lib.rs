//! Bulk messaging orchestration for dashboard contacts.
//!
//! A campaign makes sure every selected contact is a channel friend, waits for
//! the backend to confirm the friend adds, then sends each contact the
//! rendered multi-part template. Progress is tracked by [`CampaignState`].

pub mod campaign;
pub mod client;
pub mod error;
pub mod plan;
mod retry;
pub mod template;

pub use campaign::{
    run_campaign, CampaignReport, CampaignSettings, CampaignState, FriendRequestStatus,
    FriendRequestTicket, MessagingBackend, SendFailure,
};
pub use client::HttpMessagingBackend;
pub use error::MessagingError;
pub use retry::RetryPolicy;
pub use plan::{load_campaign_plan, CampaignPlan, Contact, ContactId};
pub use template::{truncate_display_name, MessageTemplate, RenderOptions};
