//! The campaign wizard session.
//!
//! [`WizardSession`] owns the step pointer, the campaign draft, the pending
//! recipient list and the independently loaded pick lists for one run of
//! the wizard. Every caught failure becomes a [`Notice`]; only local
//! validation errors and lifecycle errors are returned to the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use reach_client::models::{
    AbTest, Campaign, ExistingRecipient, SenderNumber, SmsTemplate, TestSmsRequest,
    TestSmsResponse,
};
use reach_client::SmsBackend;
use reach_core::csv::{parse_csv, CsvTable};
use reach_core::defaults::CampaignDefaults;
use reach_core::draft::{CampaignDraft, DraftSettings};
use reach_core::error::CoreError;
use reach_core::personalize;
use reach_core::recipients::{ColumnMapping, ManualRecipientInput, Recipient, RecipientList};
use reach_core::test_send::{test_message, validate_test_send, TestSendHistory};
use reach_core::types::RecordId;
use reach_core::wizard::{StepController, WizardStep};

use crate::error::WizardError;
use crate::launch::{launch_campaign, LaunchError, LaunchReport, StepOutcome};
use crate::loader::{discover_sender_numbers, LoadEvent, LoadState, Loader, SenderSource};
use crate::notice::Notice;
use crate::payload::restore_draft;
use crate::view::{ReviewSummary, StepView};

const NO_CONNECTION_NUMBERS: &str = "No phone numbers found in your SignalWire connections. \
     Please set up SignalWire in the Connections page first.";
const NO_CONFIGURED_NUMBERS: &str =
    "No phone numbers configured. Please set up SignalWire in the Connections page.";

/// One run of the SMS campaign wizard.
pub struct WizardSession {
    backend: Arc<dyn SmsBackend>,
    defaults: CampaignDefaults,
    controller: StepController,
    draft: CampaignDraft,
    recipients: RecipientList,
    test_history: TestSendHistory,

    numbers: LoadState<Vec<SenderNumber>>,
    numbers_generation: u64,
    templates: LoadState<Vec<SmsTemplate>>,
    ab_tests: LoadState<Vec<AbTest>>,
    existing: LoadState<Vec<ExistingRecipient>>,
    campaign: Option<LoadState<Campaign>>,

    notices: Vec<Notice>,
    unsaved: bool,
    finished: bool,
    cancel: CancellationToken,
    loader: Loader,
}

impl WizardSession {
    /// Start a wizard for a new campaign and begin loading the pick lists.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(backend: Arc<dyn SmsBackend>, defaults: CampaignDefaults) -> Self {
        let mut session = Self::blank(backend, defaults);
        session.start_loads();
        session
    }

    /// Start a wizard that edits the stored campaign `campaign_id`.
    ///
    /// The draft is filled in once the campaign load finishes; launching
    /// then updates that campaign instead of creating a new one. Edits made
    /// before that load is applied by [`Self::poll_loads`] or
    /// [`Self::wait_for_loads`] may be replaced by the stored values.
    pub fn resume(
        campaign_id: impl Into<RecordId>,
        backend: Arc<dyn SmsBackend>,
        defaults: CampaignDefaults,
    ) -> Self {
        let mut session = Self::blank(backend, defaults);
        let campaign_id = campaign_id.into();
        session.draft.campaign_id = Some(campaign_id.clone());
        session.campaign = Some(LoadState::Loading);
        session.loader.spawn(move |backend| async move {
            LoadEvent::Campaign(backend.get_campaign(&campaign_id).await)
        });
        session.start_loads();
        session
    }

    fn blank(backend: Arc<dyn SmsBackend>, defaults: CampaignDefaults) -> Self {
        let cancel = CancellationToken::new();
        Self {
            loader: Loader::new(Arc::clone(&backend), cancel.clone()),
            backend,
            controller: StepController::new(),
            draft: CampaignDraft::new(&defaults),
            recipients: RecipientList::new(),
            test_history: TestSendHistory::new(defaults.test_history_capacity),
            numbers: LoadState::Loading,
            numbers_generation: 0,
            templates: LoadState::Loading,
            ab_tests: LoadState::Loading,
            existing: LoadState::Loading,
            campaign: None,
            notices: Vec::new(),
            unsaved: false,
            finished: false,
            cancel,
            defaults,
        }
    }

    fn start_loads(&mut self) {
        self.loader.spawn(|backend| async move {
            LoadEvent::Templates(backend.list_templates().await)
        });
        self.loader.spawn(|backend| async move {
            LoadEvent::AbTests(backend.list_ab_tests().await)
        });
        self.loader.spawn(|backend| async move {
            LoadEvent::ExistingRecipients(backend.list_recipients().await)
        });
        self.spawn_sender_numbers();
    }

    fn spawn_sender_numbers(&mut self) {
        self.numbers_generation += 1;
        let generation = self.numbers_generation;
        self.numbers = LoadState::Loading;
        self.loader.spawn(move |backend| async move {
            LoadEvent::SenderNumbers {
                generation,
                discovery: discover_sender_numbers(backend.as_ref()).await,
            }
        });
    }

    // ---- loads ----

    /// Apply every load that has already finished. Returns how many were
    /// applied.
    pub fn poll_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.loader.try_next() {
            self.apply_load(event);
            applied += 1;
        }
        applied
    }

    /// Wait until every outstanding load has finished (or the session is
    /// closed), applying results as they arrive.
    pub async fn wait_for_loads(&mut self) {
        while let Some(event) = self.loader.next().await {
            self.apply_load(event);
        }
    }

    /// Number of section loads still in flight.
    pub fn pending_loads(&self) -> usize {
        self.loader.pending()
    }

    /// Fetch the sender numbers again.
    pub fn reload_sender_numbers(&mut self) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.spawn_sender_numbers();
        Ok(())
    }

    fn apply_load(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::SenderNumbers {
                generation,
                discovery,
            } => {
                if generation != self.numbers_generation {
                    tracing::debug!(generation, "Dropping stale sender number load");
                    return;
                }
                if discovery.numbers.is_empty() {
                    let message = match discovery.source {
                        SenderSource::Connections => NO_CONNECTION_NUMBERS,
                        SenderSource::Settings => NO_CONFIGURED_NUMBERS,
                    };
                    tracing::warn!("No sender numbers available");
                    self.notices.push(Notice::warning(message));
                }
                self.numbers = LoadState::Ready(discovery.numbers);
            }
            LoadEvent::Templates(result) => {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Error loading SMS templates");
                }
                self.templates = result.into();
            }
            LoadEvent::AbTests(result) => {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Error loading A/B tests");
                }
                self.ab_tests = result.into();
            }
            LoadEvent::ExistingRecipients(result) => {
                if let Err(e) = &result {
                    tracing::warn!(error = %e, "Error loading SMS recipients");
                }
                self.existing = result.into();
            }
            LoadEvent::Campaign(result) => {
                match &result {
                    Ok(campaign) => {
                        restore_draft(&mut self.draft, campaign);
                        self.unsaved = false;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Error loading campaign data");
                        self.notices.push(
                            Notice::error("Failed to load campaign data").with_detail(e.to_string()),
                        );
                    }
                }
                self.campaign = Some(result.into());
            }
        }
    }

    // ---- navigation ----

    pub fn current_step(&self) -> WizardStep {
        self.controller.current()
    }

    /// `(position, total)` of the current step.
    pub fn progress(&self) -> (usize, usize) {
        self.controller.progress()
    }

    /// Advance one step if the current step validates. A rejected move
    /// posts a notice and leaves the step unchanged.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        match self.controller.next(&self.draft, self.recipients.as_slice()) {
            Ok(step) => Ok(step),
            Err(e) => {
                self.notices.push(
                    Notice::error("Please fill in the required fields to continue")
                        .with_detail(e.to_string()),
                );
                Err(e.into())
            }
        }
    }

    /// Go back one step. Always allowed.
    pub fn previous(&mut self) -> WizardStep {
        self.controller.previous()
    }

    // ---- account and content ----

    pub fn set_name(&mut self, name: &str) -> Result<(), WizardError> {
        self.edit(|s| s.draft.name = name.to_string())
    }

    /// Choose the sender number; blank input clears it.
    pub fn set_sender_number(&mut self, number: &str) -> Result<(), WizardError> {
        self.edit(|s| s.draft.set_sender_number(number))
    }

    /// Choose an A/B test, or none.
    pub fn select_ab_test(&mut self, test_id: Option<&str>) -> Result<(), WizardError> {
        self.edit(|s| {
            s.draft.ab_test_id = test_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string);
        })
    }

    pub fn set_message(&mut self, message: &str) -> Result<(), WizardError> {
        self.edit(|s| s.draft.message = message.to_string())
    }

    /// Replace the message with a loaded template's text.
    pub fn apply_template(&mut self, template_id: &str) -> Result<(), WizardError> {
        self.ensure_open()?;
        let template = self
            .templates
            .items()
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "template",
                id: template_id.to_string(),
            })?;
        self.edit(|s| {
            s.draft.message = template.message;
            s.draft.template_id = Some(template.id);
        })
    }

    /// The "no template" choice: clears the message.
    pub fn clear_template(&mut self) -> Result<(), WizardError> {
        self.edit(|s| {
            s.draft.message.clear();
            s.draft.template_id = None;
        })
    }

    // ---- follow-ups ----

    /// Append an empty follow-up with the default delay. Returns its index.
    pub fn add_follow_up(&mut self) -> Result<usize, WizardError> {
        self.ensure_open()?;
        let delay = self.defaults.follow_up_delay_days(self.draft.follow_ups.len());
        self.unsaved = true;
        Ok(self.draft.add_follow_up(delay))
    }

    pub fn remove_follow_up(&mut self, index: usize) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.draft.remove_follow_up(index)?;
        self.unsaved = true;
        Ok(())
    }

    pub fn set_follow_up_content(&mut self, index: usize, content: &str) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.draft.set_follow_up_content(index, content)?;
        self.unsaved = true;
        Ok(())
    }

    /// Set a follow-up delay in days; values below one are raised to one.
    pub fn set_follow_up_delay(&mut self, index: usize, days: u32) -> Result<(), WizardError> {
        self.ensure_open()?;
        self.draft.set_follow_up_delay(index, days)?;
        self.unsaved = true;
        Ok(())
    }

    // ---- audience ----

    /// Append the rows of a parsed CSV table. Returns how many recipients
    /// were added.
    pub fn import_csv(
        &mut self,
        table: &CsvTable,
        mapping: &ColumnMapping,
    ) -> Result<usize, WizardError> {
        self.ensure_open()?;
        let added = self.recipients.import_table(table, mapping).len();
        self.unsaved = true;
        tracing::info!(added, "Recipients imported from CSV");
        self.notices
            .push(Notice::success(format!("{added} recipients added from CSV")));
        Ok(added)
    }

    /// Parse CSV text and append its rows. Without an explicit mapping the
    /// columns are matched by header name.
    pub fn import_csv_text(
        &mut self,
        text: &str,
        mapping: Option<&ColumnMapping>,
    ) -> Result<usize, WizardError> {
        self.ensure_open()?;
        let table = parse_csv(text)?;
        let guessed;
        let mapping = match mapping {
            Some(mapping) => mapping,
            None => {
                guessed = ColumnMapping::from_headers(&table.headers);
                if guessed.is_empty() {
                    return Err(CoreError::InvalidInput(
                        "No CSV column could be matched to a recipient field".to_string(),
                    )
                    .into());
                }
                &guessed
            }
        };
        self.import_csv(&table, mapping)
    }

    /// Append one recipient from the manual entry form.
    pub fn add_manual_recipient(&mut self, input: ManualRecipientInput) -> Result<(), WizardError> {
        self.ensure_open()?;
        match self.recipients.add_manual(input) {
            Ok(_) => {
                self.unsaved = true;
                self.notices.push(Notice::success("Recipient added to the list."));
                Ok(())
            }
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Pull stored recipients into the pending list. Every id must belong
    /// to a loaded stored recipient. Returns how many were added.
    pub fn select_existing(&mut self, ids: &[RecordId]) -> Result<usize, WizardError> {
        self.ensure_open()?;
        let known: Vec<Recipient> = self.existing.items().iter().map(Recipient::from).collect();
        let added = self.recipients.select_existing(ids, &known)?;
        if added > 0 {
            self.unsaved = true;
            self.notices
                .push(Notice::success(format!("{added} existing recipients added")));
        }
        Ok(added)
    }

    // ---- settings ----

    /// Edit the scheduling and throttling settings in place.
    pub fn update_settings(
        &mut self,
        update: impl FnOnce(&mut DraftSettings),
    ) -> Result<(), WizardError> {
        self.edit(|s| update(&mut s.draft.settings))
    }

    // ---- test send ----

    /// Send the current message, prefixed with `[TEST] `, to `phone`.
    ///
    /// Missing input is rejected before any network call. A backend
    /// failure posts a notice and leaves the history unchanged.
    pub async fn send_test(&mut self, phone: &str) -> Result<TestSmsResponse, WizardError> {
        self.ensure_open()?;
        let request = match validate_test_send(
            phone,
            &self.draft.message,
            self.draft.sender_number.as_deref(),
        ) {
            Ok((phone, sender)) => TestSmsRequest {
                phone_number: phone.to_string(),
                message: test_message(&self.draft.message),
                sender_number: sender.to_string(),
            },
            Err(e) => {
                self.notices.push(Notice::error(e.to_string()));
                return Err(e.into());
            }
        };

        let backend = Arc::clone(&self.backend);
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return Err(WizardError::SessionClosed),
            result = backend.send_test_sms(&request) => result,
        };

        match result {
            Ok(response) => {
                self.test_history.record(request.phone_number.clone());
                tracing::info!(phone = %request.phone_number, status = %response.status, "Test SMS sent");
                self.notices.push(Notice::success(format!(
                    "Test SMS sent successfully to {}! Status: {}",
                    request.phone_number, response.status
                )));
                Ok(response)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error sending test SMS");
                self.notices
                    .push(Notice::error("Test SMS failed").with_detail(e.to_string()));
                Err(e.into())
            }
        }
    }

    // ---- launch ----

    /// Save the campaign and attach its follow-ups and recipients.
    ///
    /// Only possible from the review step. Once the campaign is saved the
    /// session is finished, even if a dependent step failed; a failed save
    /// leaves the session open for another attempt.
    pub async fn launch(&mut self) -> Result<LaunchReport, LaunchError> {
        if self.finished || self.cancel.is_cancelled() {
            return Err(LaunchError::SessionClosed);
        }
        let step = self.controller.current();
        if step != WizardStep::Review {
            return Err(LaunchError::NotOnReview(step));
        }

        let backend = Arc::clone(&self.backend);
        let result = launch_campaign(
            backend.as_ref(),
            &mut self.draft,
            self.recipients.as_slice(),
            &self.defaults.campaign_list_route,
        )
        .await;

        match &result {
            Ok(report) => {
                self.finished = true;
                self.unsaved = false;
                self.cancel.cancel();
                self.post_launch_notices(report);
            }
            Err(e) => {
                self.notices
                    .push(Notice::error("Failed to launch campaign").with_detail(e.to_string()));
            }
        }
        result
    }

    fn post_launch_notices(&mut self, report: &LaunchReport) {
        let name = self.draft.name.trim();
        let verb = if report.created { "created" } else { "updated" };
        self.notices
            .push(Notice::success(format!("{name} has been {verb} successfully.")));

        match &report.follow_ups {
            StepOutcome::Succeeded { count } => self.notices.push(Notice::success(format!(
                "{count} follow-up SMS messages have been created for this campaign."
            ))),
            StepOutcome::Failed(e) => self.notices.push(Notice::error(e.to_string())),
            StepOutcome::Skipped => {}
        }
        match &report.recipients {
            StepOutcome::Succeeded { count } => self
                .notices
                .push(Notice::success(format!("{count} recipients added to campaign"))),
            StepOutcome::Failed(e) => self.notices.push(Notice::error(e.to_string())),
            StepOutcome::Skipped => {}
        }
    }

    // ---- lifecycle ----

    /// Abandon the session: in-flight loads are cancelled and further
    /// edits are rejected.
    pub fn close(&mut self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Closing wizard session");
        }
        self.cancel.cancel();
    }

    /// Launched or closed.
    pub fn is_finished(&self) -> bool {
        self.finished || self.cancel.is_cancelled()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.is_finished() {
            return Err(WizardError::SessionClosed);
        }
        Ok(())
    }

    fn edit(&mut self, apply: impl FnOnce(&mut Self)) -> Result<(), WizardError> {
        self.ensure_open()?;
        apply(self);
        self.unsaved = true;
        Ok(())
    }

    // ---- accessors ----

    pub fn draft(&self) -> &CampaignDraft {
        &self.draft
    }

    pub fn recipients(&self) -> &[Recipient] {
        self.recipients.as_slice()
    }

    pub fn selected_existing(&self) -> &BTreeSet<RecordId> {
        self.recipients.selected_existing()
    }

    pub fn test_history(&self) -> &TestSendHistory {
        &self.test_history
    }

    pub fn sender_numbers(&self) -> &LoadState<Vec<SenderNumber>> {
        &self.numbers
    }

    pub fn templates(&self) -> &LoadState<Vec<SmsTemplate>> {
        &self.templates
    }

    pub fn ab_tests(&self) -> &LoadState<Vec<AbTest>> {
        &self.ab_tests
    }

    pub fn existing_recipients(&self) -> &LoadState<Vec<ExistingRecipient>> {
        &self.existing
    }

    /// Load state of the campaign being edited; `None` for a new campaign.
    pub fn campaign(&self) -> Option<&LoadState<Campaign>> {
        self.campaign.as_ref()
    }

    pub fn defaults(&self) -> &CampaignDefaults {
        &self.defaults
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Remove and return all notices posted so far.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// The current step's view.
    pub fn view(&self) -> StepView<'_> {
        match self.controller.current() {
            WizardStep::Account => StepView::Account {
                name: &self.draft.name,
                sender_number: self.draft.sender_number.as_deref(),
                numbers: &self.numbers,
                ab_tests: self
                    .ab_tests
                    .items()
                    .iter()
                    .filter(|t| t.is_sms_content())
                    .collect(),
                selected_ab_test: self.draft.ab_test_id.as_deref(),
            },
            WizardStep::Content => StepView::Content {
                message: &self.draft.message,
                char_count: self.draft.message_len(),
                over_soft_cap: self.draft.over_soft_cap(self.defaults.message_soft_cap),
                soft_cap: self.defaults.message_soft_cap,
                templates: &self.templates,
                selected_template: self.draft.template_id.as_deref(),
                preview: personalize::preview(&self.draft.message),
                test_history: &self.test_history,
            },
            WizardStep::FollowUps => StepView::FollowUps {
                follow_ups: &self.draft.follow_ups,
            },
            WizardStep::Audience => StepView::Audience {
                recipients: self.recipients.as_slice(),
                existing: &self.existing,
                selected_existing: self.recipients.selected_existing(),
            },
            WizardStep::Settings => StepView::Settings {
                settings: &self.draft.settings,
            },
            WizardStep::Review => {
                StepView::Review(ReviewSummary::new(&self.draft, self.recipients.as_slice()))
            }
        }
    }
}

impl Drop for WizardSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
