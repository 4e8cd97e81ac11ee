use std::path::Path;

use placerank_core::AppConfig;
use placerank_messaging::{
    load_campaign_plan, run_campaign, CampaignPlan, CampaignSettings, CampaignState, ContactId,
    HttpMessagingBackend, RenderOptions,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct RenderedPreview {
    pub contact: ContactId,
    pub parts: Vec<String>,
}

pub(crate) fn preview(plan: &CampaignPlan, render: &RenderOptions) -> Vec<RenderedPreview> {
    plan.contacts
        .iter()
        .map(|contact| RenderedPreview {
            contact: contact.id.clone(),
            parts: plan.template.render(contact, render),
        })
        .collect()
}

/// Load a campaign plan and run it against the configured backend.
///
/// With `dry_run` the rendered messages are printed and no request is sent.
///
/// # Errors
///
/// Returns an error if the plan cannot be loaded, the backend is not
/// configured, or the campaign ends in the `failed` state.
pub(crate) async fn run_campaign_command(
    config: &AppConfig,
    plan_path: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let plan = load_campaign_plan(plan_path)?;
    let settings = CampaignSettings::from_app_config(config);
    tracing::info!(
        template = %plan.template.name,
        contacts = plan.contacts.len(),
        dry_run,
        "campaign plan loaded"
    );

    if dry_run {
        println!(
            "{}",
            serde_json::to_string_pretty(&preview(&plan, &settings.render))?
        );
        return Ok(());
    }

    let backend = HttpMessagingBackend::from_app_config(config)?;
    let report = run_campaign(&backend, &plan, &settings).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.state == CampaignState::Failed {
        anyhow::bail!(
            "campaign failed: {}",
            report.failure.as_deref().unwrap_or("unknown reason")
        );
    }
    Ok(())
}
