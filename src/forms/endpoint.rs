use super::{ConfigForm, FieldInput, FormView};
use crate::catalog::NodeKind;
use crate::config::{ConfigPatch, LlmDefaults, NodeConfig};
use crate::error::ValidationError;

/// Input and output nodes have nothing to configure beyond their label.
pub struct EndpointForm {
    kind: NodeKind,
}

impl EndpointForm {
    pub const fn new(kind: NodeKind) -> Self {
        Self { kind }
    }
}

impl ConfigForm for EndpointForm {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn render(&self, _config: &NodeConfig, _defaults: &LlmDefaults) -> FormView {
        FormView {
            kind: self.kind,
            fields: Vec::new(),
        }
    }

    fn parse_input(&self, field: &str, _input: FieldInput) -> Result<ConfigPatch, ValidationError> {
        Err(super::unknown_field(self.kind, field))
    }
}
