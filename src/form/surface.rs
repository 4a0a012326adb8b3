use std::collections::HashMap;

use super::field::{FieldKind, FormDescriptor};
use super::snapshot::FormSnapshot;

/// Query-and-render capability over the form controls.
///
/// The controller and validator only ever touch fields through this trait, so
/// the decision logic runs against [`FormState`] in tests and behind any
/// display surface in production.
pub trait FormSurface {
    fn descriptor(&self) -> &FormDescriptor;

    fn field_value(&self, name: &str) -> Option<String>;

    /// Writes `value` into the control named `name`. Returns `false` when no
    /// such control exists.
    fn set_field_value(&mut self, name: &str, value: &str) -> bool;

    /// Shows (`Some`) or clears (`None`) the inline error for `name`.
    fn render_error(&mut self, name: &str, message: Option<&str>);

    fn snapshot(&self) -> FormSnapshot {
        self.descriptor()
            .fields
            .iter()
            .map(|field| (field.name, self.field_value(field.name).unwrap_or_default()))
            .collect()
    }

    /// Restores every control to its default and clears all inline errors.
    fn reset(&mut self) {
        let defaults: Vec<_> = self
            .descriptor()
            .fields
            .iter()
            .map(|field| (field.name, field.default))
            .collect();
        for (name, default) in defaults {
            self.set_field_value(name, default);
            self.render_error(name, None);
        }
    }

    /// Rounded percentage of required fields with a non-blank value.
    fn completion_percent(&self) -> u8 {
        let required: Vec<_> = self.descriptor().required_fields().map(|f| f.name).collect();
        if required.is_empty() {
            return 100;
        }
        let filled = required
            .iter()
            .filter(|name| {
                self.field_value(name)
                    .map(|value| !value.trim().is_empty())
                    .unwrap_or(false)
            })
            .count();
        ((filled as f64 / required.len() as f64) * 100.0).round() as u8
    }
}

/// In-memory form surface: the values and inline errors of every control.
#[derive(Debug, Clone)]
pub struct FormState {
    descriptor: FormDescriptor,
    values: Vec<String>,
    errors: HashMap<&'static str, String>,
}

impl FormState {
    pub fn new(descriptor: FormDescriptor) -> Self {
        let values = descriptor
            .fields
            .iter()
            .map(|field| field.default.to_string())
            .collect();
        Self {
            descriptor,
            values,
            errors: HashMap::new(),
        }
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// Inline errors in field order.
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        self.descriptor
            .fields
            .iter()
            .filter_map(|field| {
                self.errors
                    .get(field.name)
                    .map(|message| (field.name, message.as_str()))
            })
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl FormSurface for FormState {
    fn descriptor(&self) -> &FormDescriptor {
        &self.descriptor
    }

    fn field_value(&self, name: &str) -> Option<String> {
        let index = self.descriptor.position(name)?;
        self.values.get(index).cloned()
    }

    fn set_field_value(&mut self, name: &str, value: &str) -> bool {
        let Some(index) = self.descriptor.position(name) else {
            return false;
        };
        let field = &self.descriptor.fields[index];
        // A select cannot hold a value outside its options; it falls back to
        // no selection.
        let stored = match &field.kind {
            FieldKind::Choice(_) if !value.is_empty() => field
                .kind
                .resolve_choice(value)
                .map(str::to_string)
                .unwrap_or_default(),
            _ => value.to_string(),
        };
        self.values[index] = stored;
        true
    }

    fn render_error(&mut self, name: &str, message: Option<&str>) {
        let Some(field) = self.descriptor.field(name) else {
            return;
        };
        let key = field.name;
        match message {
            Some(message) => {
                self.errors.insert(key, message.to_string());
            }
            None => {
                self.errors.remove(key);
            }
        }
    }
}
