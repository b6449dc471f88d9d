//! Change and blur adapters for raw input events

use super::Form;
use crate::error::FormResult;
use crate::path::get_in;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Kind of input that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    #[default]
    Text,
    Number,
    Range,
    Checkbox,
    Radio,
    Select,
    Other,
}

/// One option of a select input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            selected,
        }
    }
}

/// A raw input change as reported by a binding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputEvent {
    pub kind: InputKind,
    pub name: Option<String>,
    pub id: Option<String>,
    pub value: String,
    pub checked: bool,
    pub multiple: bool,
    pub options: Vec<SelectOption>,
}

impl InputEvent {
    pub fn new(kind: InputKind, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Multi-select with the given options
    pub fn select_options(mut self, options: Vec<SelectOption>) -> Self {
        self.kind = InputKind::Select;
        self.multiple = true;
        self.options = options;
        self
    }

    /// Field path: explicit name first, then id
    fn identity(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.id.as_deref().filter(|i| !i.is_empty()))
    }
}

/// Input accepted by `handle_change`
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeInput {
    /// A plain text value; needs an explicit path
    Text(String),
    Event(InputEvent),
}

impl From<InputEvent> for ChangeInput {
    fn from(event: InputEvent) -> Self {
        ChangeInput::Event(event)
    }
}

impl From<&str> for ChangeInput {
    fn from(value: &str) -> Self {
        ChangeInput::Text(value.to_string())
    }
}

impl From<String> for ChangeInput {
    fn from(value: String) -> Self {
        ChangeInput::Text(value)
    }
}

/// Blur notification carrying the input's identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurInput {
    pub name: Option<String>,
    pub id: Option<String>,
}

impl BlurInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            id: None,
        }
    }

    fn identity(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.id.as_deref().filter(|i| !i.is_empty()))
    }
}

/// Longest leading decimal literal of `raw`: sign, digits, fraction, exponent
fn float_prefix(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = digits(end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        end += 1 + fraction;
    }
    if whole + fraction == 0 {
        return "";
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let count = digits(exponent);
        if count > 0 {
            end = exponent + count;
        }
    }
    &raw[..end]
}

/// Parse the leading number of a numeric input; no leading number becomes `""`
fn coerce_number(raw: &str) -> Value {
    let Ok(parsed) = float_prefix(raw.trim_start()).parse::<f64>() else {
        return Value::String(String::new());
    };
    if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(parsed as i64));
    }
    Number::from_f64(parsed)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(String::new()))
}

/// Next value for a checkbox given the field's current value.
///
/// Checking a value already in the list leaves the list as is; only
/// unchecking removes it.
fn coerce_checkbox(current: Option<&Value>, checked: bool, value: &str) -> Value {
    let items = match current {
        Some(Value::Bool(_)) => return Value::Bool(checked),
        Some(Value::Array(items)) => items.clone(),
        _ => {
            if value.is_empty() || value == "true" || value == "false" {
                return Value::Bool(checked);
            }
            Vec::new()
        }
    };

    let option = Value::String(value.to_string());
    let position = items.iter().position(|item| item == &option);
    match (checked, position) {
        (true, None) => {
            let mut items = items;
            items.push(option);
            Value::Array(items)
        }
        (false, Some(index)) => {
            let mut items = items;
            items.remove(index);
            Value::Array(items)
        }
        _ => Value::Array(items),
    }
}

impl Form {
    /// Apply a raw change to the field it identifies.
    ///
    /// The field is `path` if given, else the event's name, else its id.
    /// Without any identity the change is dropped with a warning.
    pub async fn handle_change(&self, input: impl Into<ChangeInput>, path: Option<&str>) -> FormResult<()> {
        let (field, value) = match input.into() {
            ChangeInput::Text(text) => {
                let Some(field) = path else {
                    tracing::warn!("text change without a field path, ignoring");
                    return Ok(());
                };
                (field.to_string(), Value::String(text))
            }
            ChangeInput::Event(event) => {
                let Some(field) = path.or_else(|| event.identity()).map(str::to_string) else {
                    tracing::warn!(kind = ?event.kind, "change event without name or id, ignoring");
                    return Ok(());
                };
                let value = self.coerce_event(&field, &event);
                (field, value)
            }
        };
        self.set_field_value(&field, value, None).await
    }

    /// Mark the blurred field touched
    pub async fn handle_blur(&self, input: BlurInput, path: Option<&str>) -> FormResult<()> {
        let Some(field) = path.or_else(|| input.identity()).map(str::to_string) else {
            tracing::warn!("blur event without name or id, ignoring");
            return Ok(());
        };
        self.set_field_touched(&field, true, None).await
    }

    /// Submit, logging failures instead of returning them
    pub async fn handle_submit(&self) {
        match self.submit_form().await {
            Ok(outcome) => tracing::debug!(?outcome, "submit finished"),
            Err(err) => tracing::warn!(error = %err, "submit failed"),
        }
    }

    pub async fn handle_reset(&self) -> FormResult<()> {
        self.reset_form(None).await
    }

    fn coerce_event(&self, field: &str, event: &InputEvent) -> Value {
        match event.kind {
            InputKind::Number | InputKind::Range => coerce_number(&event.value),
            InputKind::Checkbox => {
                let state = self.state();
                coerce_checkbox(get_in(&state.values, field), event.checked, &event.value)
            }
            InputKind::Select if event.multiple => Value::Array(
                event
                    .options
                    .iter()
                    .filter(|o| o.selected)
                    .map(|o| Value::String(o.value.clone()))
                    .collect(),
            ),
            _ => Value::String(event.value.clone()),
        }
    }
}
