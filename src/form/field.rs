//! Per-field projections for bindings

use super::events::InputKind;
use super::Form;
use crate::error::FormResult;
use crate::path::get_in;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loose truthiness: `null`, `false`, `0`, and `""` are falsy
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Read-only view of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub value: Option<Value>,
    pub error: Option<Value>,
    pub touched: bool,
    pub initial_value: Option<Value>,
    pub initial_touched: bool,
    pub initial_error: Option<Value>,
}

/// Setters bound to one field path
#[derive(Debug, Clone)]
pub struct FieldHelpers {
    form: Form,
    path: String,
}

impl FieldHelpers {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn set_value(&self, value: Value, should_validate: Option<bool>) -> FormResult<()> {
        self.form.set_field_value(&self.path, value, should_validate).await
    }

    pub async fn set_touched(&self, touched: bool, should_validate: Option<bool>) -> FormResult<()> {
        self.form
            .set_field_touched(&self.path, touched, should_validate)
            .await
    }

    pub fn set_error(&self, error: Option<&str>) {
        self.form.set_field_error(&self.path, error);
    }
}

/// Options form of a field spec
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOptions {
    pub name: String,
    pub kind: InputKind,
    /// Option value for checkboxes and radios
    pub value: Option<Value>,
    pub multiple: bool,
}

/// A field given by name alone or with input options
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    Name(String),
    Options(FieldOptions),
}

impl From<&str> for FieldSpec {
    fn from(name: &str) -> Self {
        FieldSpec::Name(name.to_string())
    }
}

impl From<String> for FieldSpec {
    fn from(name: String) -> Self {
        FieldSpec::Name(name)
    }
}

impl From<FieldOptions> for FieldSpec {
    fn from(options: FieldOptions) -> Self {
        FieldSpec::Options(options)
    }
}

/// Props a binding renders an input with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProps {
    pub name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
}

impl Form {
    pub fn get_field_meta(&self, path: &str) -> FieldMeta {
        let state = self.state();
        let baseline = self.baseline().clone();
        FieldMeta {
            value: get_in(&state.values, path).cloned(),
            error: get_in(&state.errors, path).cloned(),
            touched: get_in(&state.touched, path).is_some_and(truthy),
            initial_value: get_in(&baseline.values, path).cloned(),
            initial_touched: get_in(&baseline.touched, path).is_some_and(truthy),
            initial_error: get_in(&baseline.errors, path).cloned(),
        }
    }

    pub fn get_field_helpers(&self, path: impl Into<String>) -> FieldHelpers {
        FieldHelpers {
            form: self.clone(),
            path: path.into(),
        }
    }

    pub fn get_field_props(&self, spec: impl Into<FieldSpec>) -> FieldProps {
        let state = self.state();
        let options = match spec.into() {
            FieldSpec::Name(name) => FieldOptions {
                name,
                ..FieldOptions::default()
            },
            FieldSpec::Options(options) => options,
        };
        let current = get_in(&state.values, &options.name).cloned().unwrap_or(Value::Null);

        let mut props = FieldProps {
            name: options.name,
            value: current,
            checked: None,
            multiple: None,
        };
        match (options.kind, options.value) {
            (InputKind::Checkbox, None) => {
                props.checked = Some(truthy(&props.value));
            }
            (InputKind::Checkbox, Some(option)) => {
                let checked = matches!(&props.value, Value::Array(items) if items.contains(&option));
                props.checked = Some(checked);
                props.value = option;
            }
            (InputKind::Radio, option) => {
                let option = option.unwrap_or(Value::Null);
                props.checked = Some(props.value == option);
                props.value = option;
            }
            (InputKind::Select, _) if options.multiple => {
                if !truthy(&props.value) {
                    props.value = Value::Array(Vec::new());
                }
                props.multiple = Some(true);
            }
            _ => {}
        }
        props
    }
}
