//! Declarative description of what the form should look like. Produced by
//! [`crate::controller::FormController::view`]; renderers only read it.

use crate::{notifier::Severity, report::SubmissionSummary};

/// Tab-order stops: every field, then the two buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Field(&'static str),
    SaveDraftButton,
    SubmitButton,
}

impl FocusTarget {
    pub fn label(&self) -> &'static str {
        match self {
            FocusTarget::Field(name) => name,
            FocusTarget::SaveDraftButton => "save-draft",
            FocusTarget::SubmitButton => "submit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub required: bool,
    pub error: Option<String>,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub color: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub title: &'static str,
    pub fields: Vec<FieldView>,
    pub notification: Option<NotificationView>,
    pub modal: Option<SubmissionSummary>,
    pub submit_enabled: bool,
    pub busy: bool,
    pub scroll_locked: bool,
    pub focus: Option<FocusTarget>,
    pub progress: u8,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// `(field, message)` for every field showing an inline error.
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        self.fields
            .iter()
            .filter_map(|field| field.error.as_deref().map(|error| (field.name, error)))
            .collect()
    }
}
