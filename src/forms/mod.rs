//! Configuration forms, one per node kind.
//!
//! A form is a pure mapping in both directions: [`ConfigForm::render`] turns a
//! stored config into a [`FormView`] for the panel, and
//! [`ConfigForm::parse_input`] turns raw widget input into a validated
//! [`ConfigPatch`]. Forms never touch the graph themselves.

use crate::catalog::NodeKind;
use crate::config::{ConfigPatch, LlmDefaults, NodeConfig};
use crate::error::ValidationError;

mod chunk;
mod clean;
mod endpoint;
mod extract;
mod partition;

pub use chunk::ChunkForm;
pub use clean::CleanForm;
pub use endpoint::EndpointForm;
pub use extract::ExtractForm;
pub use partition::PartitionForm;

/// The contract every per-kind form implements.
pub trait ConfigForm: Send + Sync {
    fn kind(&self) -> NodeKind;

    /// Describes the panel for `config`. A config of another kind renders as the
    /// kind's defaults.
    fn render(&self, config: &NodeConfig, defaults: &LlmDefaults) -> FormView;

    /// Converts raw input for `field` into a patch, or refuses it.
    fn parse_input(&self, field: &str, input: FieldInput) -> Result<ConfigPatch, ValidationError>;
}

/// Returns the form responsible for `kind`.
pub fn form_for(kind: NodeKind) -> &'static dyn ConfigForm {
    static INPUT: EndpointForm = EndpointForm::new(NodeKind::Input);
    static OUTPUT: EndpointForm = EndpointForm::new(NodeKind::Output);
    match kind {
        NodeKind::Input => &INPUT,
        NodeKind::Partition => &PartitionForm,
        NodeKind::Clean => &CleanForm,
        NodeKind::Chunk => &ChunkForm,
        NodeKind::ExtractLLM => &ExtractForm,
        NodeKind::Output => &OUTPUT,
    }
}

/// Raw input coming from a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Text(String),
    Toggle(bool),
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Text(value.to_string())
    }
}

impl From<bool> for FieldInput {
    fn from(value: bool) -> Self {
        FieldInput::Toggle(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Select { options: Vec<&'static str> },
    Text,
    TextArea,
    Number {
        min: Option<f64>,
        max: Option<f64>,
        step: f64,
    },
    Toggle,
}

/// The value a widget displays. `Number(None)` renders as an empty box.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Option<f64>),
    Bool(bool),
    Choice(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub value: FieldValue,
    /// Hidden fields keep their stored value; they are only not shown.
    pub visible: bool,
    pub placeholder: Option<String>,
}

impl FormField {
    fn new(key: &'static str, label: &'static str, widget: Widget, value: FieldValue) -> Self {
        Self {
            key,
            label,
            widget,
            value,
            visible: true,
            placeholder: None,
        }
    }

    fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormView {
    pub kind: NodeKind,
    pub fields: Vec<FormField>,
}

impl FormView {
    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter().filter(|f| f.visible)
    }
}

fn unknown_field(kind: NodeKind, field: &str) -> ValidationError {
    ValidationError::UnknownField {
        kind,
        field: field.to_string(),
    }
}

fn text_input(input: FieldInput) -> String {
    match input {
        FieldInput::Text(text) => text,
        FieldInput::Toggle(b) => b.to_string(),
    }
}

fn bool_input(field: &'static str, input: FieldInput) -> Result<bool, ValidationError> {
    match input {
        FieldInput::Toggle(b) => Ok(b),
        FieldInput::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ValidationError::UnknownOption {
                field,
                value: text,
                allowed: "true, false".to_string(),
            }),
        },
    }
}

/// Parses an optional integer field.
///
/// Blank or non-numeric text leaves the value undefined (`None`). A number that
/// is fractional or below `min` is refused.
fn optional_int(
    field: &'static str,
    input: FieldInput,
    min: u32,
    expected: &'static str,
) -> Result<Option<u32>, ValidationError> {
    let text = text_input(input);
    let trimmed = text.trim();
    let Ok(number) = trimmed.parse::<f64>() else {
        return Ok(None);
    };
    if !number.is_finite() {
        return Ok(None);
    }
    if number.fract() != 0.0 || number < f64::from(min) || number > f64::from(u32::MAX) {
        return Err(ValidationError::OutOfRange {
            field,
            value: trimmed.to_string(),
            expected,
        });
    }
    Ok(Some(number as u32))
}

/// Parses an optional float field bounded to `[min, max]`.
fn optional_float(
    field: &'static str,
    input: FieldInput,
    min: f64,
    max: f64,
    expected: &'static str,
) -> Result<Option<f64>, ValidationError> {
    let text = text_input(input);
    let trimmed = text.trim();
    let Ok(number) = trimmed.parse::<f64>() else {
        return Ok(None);
    };
    if !number.is_finite() {
        return Ok(None);
    }
    if !(min..=max).contains(&number) {
        return Err(ValidationError::OutOfRange {
            field,
            value: trimmed.to_string(),
            expected,
        });
    }
    Ok(Some(number))
}

/// Blank text clears an optional override.
fn optional_text(input: FieldInput) -> Option<String> {
    let text = text_input(input);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
