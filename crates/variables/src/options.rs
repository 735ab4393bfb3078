use crate::value::Sequence;
use std::collections::HashMap;
use xformula_model::{AspectModel, QName};

#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    aspect_model: AspectModel,
    implicit_filtering: bool,
    parameters: HashMap<QName, Sequence>,
    order: Option<Vec<QName>>,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            aspect_model: AspectModel::Dimensional,
            implicit_filtering: true,
            parameters: HashMap::new(),
            order: None,
        }
    }
}

impl EvaluatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aspect_model(mut self, model: AspectModel) -> Self {
        self.aspect_model = model;
        self
    }

    pub fn aspect_model(&self) -> AspectModel {
        self.aspect_model
    }

    /// Global switch; when off, no fact variable is implicitly filtered.
    pub fn with_implicit_filtering(mut self, enabled: bool) -> Self {
        self.implicit_filtering = enabled;
        self
    }

    pub fn implicit_filtering(&self) -> bool {
        self.implicit_filtering
    }

    pub fn with_parameter(mut self, name: QName, value: Sequence) -> Self {
        self.parameters.insert(name, value);
        self
    }

    pub fn parameters(&self) -> &HashMap<QName, Sequence> {
        &self.parameters
    }

    /// Evaluation order to use instead of the dependency plan.
    pub fn with_order(mut self, order: Vec<QName>) -> Self {
        self.order = Some(order);
        self
    }

    pub fn order(&self) -> Option<&[QName]> {
        self.order.as_deref()
    }
}
