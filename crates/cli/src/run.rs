//! Drive a [`WizardSession`] from a campaign file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};

use reach_client::SmsBackend;
use reach_core::defaults::CampaignDefaults;
use reach_wizard::{LaunchReport, NoticeLevel, StepOutcome, WizardSession};

use crate::args::Args;
use crate::campaign_file::CampaignFile;

/// How a run ended, when it did not fail.
#[derive(Debug)]
pub enum RunOutcome {
    /// `--dry-run`: the wizard reached review and nothing was saved.
    DryRun,
    Launched(LaunchReport),
}

pub fn load_defaults(path: Option<&Path>) -> anyhow::Result<CampaignDefaults> {
    let Some(path) = path else {
        return Ok(CampaignDefaults::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read defaults file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid defaults file {}", path.display()))
}

pub fn load_campaign(path: &Path) -> anyhow::Result<CampaignFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read campaign file {}", path.display()))?;
    CampaignFile::from_json(&text)
        .with_context(|| format!("Invalid campaign file {}", path.display()))
}

/// Read the files named by `args` and run the wizard against `backend`.
pub async fn run(args: &Args, backend: Arc<dyn SmsBackend>) -> anyhow::Result<RunOutcome> {
    let defaults = load_defaults(args.defaults.as_deref())?;
    let campaign = load_campaign(&args.campaign)?;
    let csv = match &args.recipients {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read recipients file {}", path.display()))?,
        ),
        None => None,
    };

    let mut session = match &args.edit {
        Some(id) => WizardSession::resume(id, backend, defaults),
        None => WizardSession::new(backend, defaults),
    };
    let outcome = fill_and_launch(&mut session, &campaign, csv.as_deref(), args.dry_run).await;
    log_notices(&mut session);
    session.close();
    outcome
}

/// Walk every step with the values from `campaign`, printing each step
/// before leaving it, then launch unless `dry_run` is set.
pub async fn fill_and_launch(
    session: &mut WizardSession,
    campaign: &CampaignFile,
    csv: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<RunOutcome> {
    session.wait_for_loads().await;
    if let Some(state) = session.campaign() {
        if let Some(error) = state.error() {
            bail!("Could not load the campaign to edit: {error}");
        }
    }
    log_notices(session);

    // Account
    if !campaign.name.is_empty() {
        session.set_name(&campaign.name)?;
    }
    let sender = match &campaign.sender_number {
        Some(number) => Some(number.clone()),
        None if session.draft().sender_number.is_none() => session
            .sender_numbers()
            .items()
            .first()
            .map(|n| n.phone_number.clone()),
        None => None,
    };
    if let Some(sender) = sender {
        session.set_sender_number(&sender)?;
    }
    if campaign.ab_test_id.is_some() {
        session.select_ab_test(campaign.ab_test_id.as_deref())?;
    }
    advance(session)?;

    // Content
    if let Some(id) = &campaign.template_id {
        session.apply_template(id)?;
    }
    if !campaign.message.is_empty() {
        session.set_message(&campaign.message)?;
    }
    if let Some(phone) = &campaign.test_phone {
        // A failed test send is reported and does not stop the run.
        if let Err(e) = session.send_test(phone).await {
            tracing::warn!(error = %e, phone = %phone, "Test SMS not sent");
        }
    }
    advance(session)?;

    // Follow-ups
    for entry in &campaign.follow_ups {
        let i = session.add_follow_up()?;
        session.set_follow_up_content(i, &entry.content)?;
        if let Some(days) = entry.delay_days {
            session.set_follow_up_delay(i, days)?;
        }
    }
    advance(session)?;

    // Audience
    if let Some(text) = csv {
        session.import_csv_text(text, None)?;
    }
    if !campaign.existing_recipient_ids.is_empty() {
        session.select_existing(&campaign.existing_recipient_ids)?;
    }
    advance(session)?;

    // Settings
    let settings = campaign.settings.apply_to(&session.draft().settings)?;
    session.update_settings(|s| *s = settings)?;
    advance(session)?;

    println!("{}", session.view());
    if dry_run {
        tracing::info!("Dry run, campaign not launched");
        return Ok(RunOutcome::DryRun);
    }

    let report = session.launch().await;
    log_notices(session);
    let report = report.context("Campaign launch failed")?;
    print_report(&report);
    Ok(RunOutcome::Launched(report))
}

/// Print the current step and move past it.
fn advance(session: &mut WizardSession) -> anyhow::Result<()> {
    println!("{}", session.view());
    let step = session.current_step();
    let result = session.next();
    log_notices(session);
    result.with_context(|| format!("Cannot continue past the {} step", step.title()))?;
    Ok(())
}

fn log_notices(session: &mut WizardSession) {
    for notice in session.take_notices() {
        let detail = notice.detail.as_deref();
        match notice.level {
            NoticeLevel::Error => tracing::error!(detail, "{}", notice.title),
            NoticeLevel::Warning => tracing::warn!(detail, "{}", notice.title),
            NoticeLevel::Success | NoticeLevel::Info => tracing::info!(detail, "{}", notice.title),
        }
    }
}

fn print_report(report: &LaunchReport) {
    let verb = if report.created { "Created" } else { "Updated" };
    println!("{verb} campaign {}", report.campaign_id);
    for (label, outcome) in [("follow-ups", &report.follow_ups), ("recipients", &report.recipients)] {
        match outcome {
            StepOutcome::Skipped => println!("  {label}: none"),
            StepOutcome::Succeeded { count } => println!("  {label}: {count} added"),
            StepOutcome::Failed(e) => println!("  {label}: {e}"),
        }
    }
    println!("Next: {}", report.redirect_to);
}
