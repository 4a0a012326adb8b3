//! Form controller: routes user events to validation, draft persistence and
//! notifications, and drives the submission lifecycle
//! `Idle -> Validating -> (Idle | Submitting -> Idle)`.

use std::{fmt, path::Path, path::PathBuf, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    config::Config,
    draft::{Draft, DraftStore},
    errors::{FormError, Result},
    form::{FormDescriptor, FormSnapshot, FormState, FormSurface},
    notifier::{Notification, Notifier, Severity},
    report::{self, SubmissionSummary},
    scheduler::{Clock, Debouncer, Scheduler, TimerQueue},
    storage::KeyValueStore,
    submission::{SubmissionReceipt, Submitter},
    validation::{ValidationResult, Validator},
    view::{FieldView, FocusTarget, FormView, NotificationView},
};

pub const INVALID_FORM_MESSAGE: &str = "Please fill in all required fields correctly";
pub const SUBMISSION_FAILED_MESSAGE: &str = "Submission failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Validating,
    Submitting,
}

/// Work deferred through the timer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Autosave,
    CompleteSubmission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    pub fn tab() -> Self {
        Self::new(Key::Tab)
    }

    pub fn shift_tab() -> Self {
        Self {
            shift: true,
            ..Self::tab()
        }
    }

    pub fn ctrl(ch: char) -> Self {
        Self {
            ctrl: true,
            ..Self::new(Key::Char(ch))
        }
    }
}

impl FromStr for KeyPress {
    type Err = String;

    /// Parses combinations such as `tab`, `shift+tab` or `ctrl+s`.
    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let mut ctrl = false;
        let mut shift = false;
        let mut key = None;
        for part in input.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => ctrl = true,
                "shift" => shift = true,
                "tab" => key = Some(Key::Tab),
                "enter" | "return" => key = Some(Key::Enter),
                "esc" | "escape" => key = Some(Key::Escape),
                _ => {
                    let mut chars = part.chars();
                    match (chars.next(), chars.next()) {
                        (Some(ch), None) => key = Some(Key::Char(ch)),
                        _ => return Err(format!("unknown key `{}`", part)),
                    }
                }
            }
        }
        let key = key.ok_or_else(|| format!("no key in `{}`", input))?;
        Ok(Self { key, ctrl, shift })
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        match self.key {
            Key::Tab => f.write_str("tab"),
            Key::Enter => f.write_str("enter"),
            Key::Escape => f.write_str("esc"),
            Key::Char(ch) => write!(f, "{}", ch),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Input { name: String, value: String },
    Change { name: String, value: String },
    Focus(String),
    Blur(String),
    Key(KeyPress),
    Submit,
    SaveDraft,
    CloseModal,
    BackdropClick { on_content: bool },
    DismissNotification,
}

/// Whether the platform's default handling of an event was suppressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub default_prevented: bool,
}

impl EventOutcome {
    fn prevented() -> Self {
        Self {
            default_prevented: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; the listed fields show inline errors.
    Invalid(Vec<(&'static str, String)>),
    /// Submission scheduled; it completes on a later [`FormController::tick`].
    Pending,
    /// A submission is already in flight.
    Ignored,
}

pub struct FormController<S, P, C>
where
    S: KeyValueStore,
    P: Submitter,
    C: Clock + Clone,
{
    form: FormState,
    drafts: DraftStore<S>,
    notifier: Notifier<C>,
    timers: TimerQueue<Task, C>,
    submitter: P,
    clock: C,
    submission_delay: Duration,
    phase: SubmitPhase,
    in_flight: Option<FormSnapshot>,
    modal: Option<SubmissionSummary>,
    last_receipt: Option<SubmissionReceipt>,
    focus: Option<FocusTarget>,
}

impl<S, P, C> FormController<S, P, C>
where
    S: KeyValueStore,
    P: Submitter,
    C: Clock + Clone,
{
    pub fn new(
        descriptor: FormDescriptor,
        storage: S,
        submitter: P,
        clock: C,
        config: &Config,
    ) -> Self {
        Self {
            form: FormState::new(descriptor),
            drafts: DraftStore::new(
                storage,
                config.draft_key.clone(),
                Debouncer::new(config.autosave_delay()),
            ),
            notifier: Notifier::new(clock.clone(), config.notification_timeout()),
            timers: TimerQueue::new(clock.clone()),
            submitter,
            clock,
            submission_delay: config.submission_delay(),
            phase: SubmitPhase::Idle,
            in_flight: None,
            modal: None,
            last_receipt: None,
            focus: None,
        }
    }

    /// Application start: restores any saved draft into the form.
    pub fn start(&mut self) -> Option<Draft> {
        tracing::debug!(action = "form_loaded", form = self.form.descriptor().name);
        self.drafts.load(&mut self.form, &mut self.notifier)
    }

    pub fn handle(&mut self, event: FormEvent) -> Result<EventOutcome> {
        match event {
            FormEvent::Input { name, value } => self.input(&name, &value)?,
            FormEvent::Change { name, value } => self.change(&name, &value)?,
            FormEvent::Focus(name) => self.focus_field(&name)?,
            FormEvent::Blur(name) => {
                self.blur(&name)?;
            }
            FormEvent::Key(key) => return Ok(self.key(key)),
            FormEvent::Submit => {
                self.submit();
                return Ok(EventOutcome::prevented());
            }
            FormEvent::SaveDraft => {
                self.save_draft();
            }
            FormEvent::CloseModal => {
                self.close_modal();
            }
            FormEvent::BackdropClick { on_content } => {
                self.backdrop_click(on_content);
            }
            FormEvent::DismissNotification => {
                self.notifier.dismiss();
            }
        }
        Ok(EventOutcome::default())
    }

    /// Keystroke-level edit: clears the field's inline error and re-arms the
    /// autosave debounce.
    pub fn input(&mut self, name: &str, value: &str) -> Result<()> {
        self.set_value(name, value)?;
        self.form.render_error(name, None);
        self.drafts.schedule_autosave(&mut self.timers, Task::Autosave);
        tracing::debug!(
            field = name,
            progress = self.form.completion_percent(),
            "form progress"
        );
        Ok(())
    }

    /// Committed edit (select, checkbox): saves the draft immediately.
    pub fn change(&mut self, name: &str, value: &str) -> Result<()> {
        self.set_value(name, value)?;
        self.save_draft();
        Ok(())
    }

    pub fn focus_field(&mut self, name: &str) -> Result<()> {
        let field = self.field_name(name)?;
        self.move_focus(Some(FocusTarget::Field(field)));
        Ok(())
    }

    /// Validates the field that lost focus.
    pub fn blur(&mut self, name: &str) -> Result<ValidationResult> {
        let field = self.field_name(name)?;
        if self.focus == Some(FocusTarget::Field(field)) {
            self.focus = None;
        }
        tracing::debug!(action = "field_blurred", field);
        Ok(self.validator().validate_field(&mut self.form, field))
    }

    /// Explicit save: bypasses validation and any pending autosave.
    pub fn save_draft(&mut self) -> Option<Draft> {
        self.drafts.cancel_autosave::<Task, _>(&mut self.timers);
        self.persist_draft()
    }

    /// Saves immediately if an autosave is still waiting for its quiet window.
    pub fn flush(&mut self) -> Option<Draft> {
        if self.drafts.autosave_pending() {
            self.save_draft()
        } else {
            None
        }
    }

    /// Full-form validation without submitting.
    pub fn validate_form(&mut self) -> bool {
        self.validator().validate_form(&mut self.form)
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if self.phase == SubmitPhase::Submitting {
            tracing::warn!("submit ignored: submission already in flight");
            return SubmitOutcome::Ignored;
        }

        self.phase = SubmitPhase::Validating;
        let failures = self.validator().validate_all(&mut self.form);
        if !failures.is_empty() {
            tracing::debug!(failed = failures.len(), "submission blocked by validation");
            self.notifier.notify(INVALID_FORM_MESSAGE, Severity::Error);
            self.phase = SubmitPhase::Idle;
            return SubmitOutcome::Invalid(failures);
        }

        self.in_flight = Some(self.form.snapshot());
        self.phase = SubmitPhase::Submitting;
        self.timers.after(self.submission_delay, Task::CompleteSubmission);
        SubmitOutcome::Pending
    }

    /// Runs every timer that is due and expires a stale notification.
    /// Returns the number of timers run.
    pub fn tick(&mut self) -> usize {
        let due = self.timers.due();
        let ran = due.len();
        for (id, task) in due {
            match task {
                Task::Autosave => {
                    if self.drafts.autosave_fired(id) {
                        self.persist_draft();
                    }
                }
                Task::CompleteSubmission => self.complete_submission(),
            }
        }
        if let Some(expired) = self.notifier.expire() {
            tracing::debug!(id = expired.id, "notification expired");
        }
        ran
    }

    pub fn close_modal(&mut self) -> bool {
        self.modal.take().is_some()
    }

    /// Clicks on the overlay close the modal; clicks on its content do not.
    pub fn backdrop_click(&mut self, on_content: bool) -> bool {
        if on_content {
            return false;
        }
        self.close_modal()
    }

    pub fn dismiss_notification(&mut self) -> Option<Notification> {
        self.notifier.dismiss()
    }

    pub fn key(&mut self, key: KeyPress) -> EventOutcome {
        match key.key {
            Key::Char('s') if key.ctrl => {
                self.save_draft();
                EventOutcome::prevented()
            }
            Key::Tab if !key.ctrl => self.tab(key.shift),
            _ => EventOutcome::default(),
        }
    }

    /// Tab order wraps at both ends; elsewhere focus moves one stop.
    fn tab(&mut self, backwards: bool) -> EventOutcome {
        let order = self.focus_order();
        let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
            return EventOutcome::default();
        };

        match (backwards, self.focus) {
            (true, Some(current)) if current == first => {
                self.move_focus(Some(last));
                EventOutcome::prevented()
            }
            (false, Some(current)) if current == last => {
                self.move_focus(Some(first));
                EventOutcome::prevented()
            }
            (_, current) => {
                let index = current.and_then(|target| order.iter().position(|o| *o == target));
                let next = match (index, backwards) {
                    (None, false) => first,
                    (None, true) => last,
                    (Some(i), false) => order.get(i + 1).copied().unwrap_or(first),
                    (Some(i), true) => order.get(i.wrapping_sub(1)).copied().unwrap_or(last),
                };
                self.move_focus(Some(next));
                EventOutcome::default()
            }
        }
    }

    pub fn focus_order(&self) -> Vec<FocusTarget> {
        self.form
            .descriptor()
            .names()
            .map(FocusTarget::Field)
            .chain([FocusTarget::SaveDraftButton, FocusTarget::SubmitButton])
            .collect()
    }

    /// Moving focus off a field blurs it.
    fn move_focus(&mut self, target: Option<FocusTarget>) {
        let previous = self.focus;
        if previous == target {
            return;
        }
        if let Some(FocusTarget::Field(name)) = previous {
            tracing::debug!(action = "field_blurred", field = name);
            self.validator().validate_field(&mut self.form, name);
        }
        self.focus = target;
        if let Some(FocusTarget::Field(name)) = target {
            tracing::debug!(action = "field_focused", field = name);
        }
    }

    fn complete_submission(&mut self) {
        let Some(snapshot) = self.in_flight.take() else {
            self.phase = SubmitPhase::Idle;
            return;
        };

        match self.submitter.submit(&snapshot) {
            Ok(receipt) => {
                self.modal = Some(SubmissionSummary::from_snapshot(&snapshot));
                if let Err(err) = self.drafts.clear() {
                    tracing::error!(error = %err, "failed to clear draft after submission");
                }
                self.drafts.cancel_autosave::<Task, _>(&mut self.timers);
                self.form.reset();
                tracing::info!(reference = %receipt.reference, "submission completed");
                self.last_receipt = Some(receipt);
            }
            Err(err) => {
                tracing::warn!(error = %err, "submission failed");
                self.notifier.notify(SUBMISSION_FAILED_MESSAGE, Severity::Error);
            }
        }
        self.phase = SubmitPhase::Idle;
    }

    fn persist_draft(&mut self) -> Option<Draft> {
        let snapshot = self.form.snapshot();
        // Failures are logged and announced by the draft store.
        self.drafts.save(&snapshot, &mut self.notifier).ok()
    }

    fn set_value(&mut self, name: &str, value: &str) -> Result<()> {
        if self.form.set_field_value(name, value) {
            Ok(())
        } else {
            Err(FormError::UnknownField(name.to_string()))
        }
    }

    fn field_name(&self, name: &str) -> Result<&'static str> {
        self.form
            .descriptor()
            .field(name)
            .map(|field| field.name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    fn validator(&self) -> Validator {
        Validator::new(self.clock.today())
    }

    pub fn view(&self) -> FormView {
        let fields = self
            .form
            .descriptor()
            .fields
            .iter()
            .map(|field| FieldView {
                name: field.name,
                label: field.label,
                value: self.form.field_value(field.name).unwrap_or_default(),
                required: field.required,
                error: self.form.error(field.name).map(str::to_string),
                focused: self.focus == Some(FocusTarget::Field(field.name)),
            })
            .collect();

        let notification = self.notifier.current().map(|active| NotificationView {
            id: active.id,
            message: active.message.clone(),
            severity: active.severity,
            color: active.severity.color(),
            icon: active.severity.icon(),
        });

        FormView {
            title: self.form.descriptor().name,
            fields,
            notification,
            modal: self.modal.clone(),
            submit_enabled: self.phase != SubmitPhase::Submitting,
            busy: self.phase == SubmitPhase::Submitting,
            scroll_locked: self.modal.is_some(),
            focus: self.focus,
            progress: self.form.completion_percent(),
        }
    }

    pub fn export(&self, path: &Path, file_name: &str) -> Result<PathBuf> {
        report::write_export(&self.form.snapshot(), path, file_name)
    }

    pub fn print_view(&self) -> String {
        report::print_view(&self.form.snapshot())
    }

    pub fn snapshot(&self) -> FormSnapshot {
        self.form.snapshot()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn drafts(&self) -> &DraftStore<S> {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftStore<S> {
        &mut self.drafts
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifier.current()
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == SubmitPhase::Submitting
    }

    pub fn modal(&self) -> Option<&SubmissionSummary> {
        self.modal.as_ref()
    }

    pub fn last_receipt(&self) -> Option<&SubmissionReceipt> {
        self.last_receipt.as_ref()
    }

    pub fn focus(&self) -> Option<FocusTarget> {
        self.focus
    }

    pub fn submitter(&self) -> &P {
        &self.submitter
    }

    /// Earliest instant at which [`FormController::tick`] has work to do.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.timers.next_deadline(), self.notifier.next_expiry()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
