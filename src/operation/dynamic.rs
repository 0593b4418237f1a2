// src/operation/dynamic.rs

//! Untyped operations driven purely by a parameter map.

use std::fmt;
use std::sync::Arc;

use crate::errors::{FoundationError, Result};
use crate::operation::{Operation, Parameters};

type Handler = dyn Fn(&Parameters, Parameters) -> Result<toml::Value> + Send + Sync;

/// An operation whose configuration is an open-ended [`Parameters`] map.
///
/// The handler receives the configured parameters and the call-time input
/// (also a parameter map). An operation built without a handler has nothing
/// to run and fails every call with [`FoundationError::NotImplemented`].
#[derive(Clone)]
pub struct ParameterizedOperation {
    name: String,
    parameters: Parameters,
    handler: Option<Arc<Handler>>,
}

impl fmt::Debug for ParameterizedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterizedOperation")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl ParameterizedOperation {
    pub fn new(name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            name: name.into(),
            parameters,
            handler: None,
        }
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Parameters, Parameters) -> Result<toml::Value> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl Operation for ParameterizedOperation {
    type Input = Parameters;
    type Output = toml::Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Parameters {
        self.parameters.clone()
    }

    fn execute(&self, input: Parameters) -> Result<toml::Value> {
        match &self.handler {
            Some(handler) => handler(&self.parameters, input),
            None => Err(FoundationError::NotImplemented(format!(
                "operation '{}' has no execute implementation",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationExt;

    #[test]
    fn missing_handler_is_not_implemented() {
        let op = ParameterizedOperation::new("noop", Parameters::new().with("x", 1));
        let err = op.call(Parameters::new()).unwrap_err();
        assert!(matches!(err, FoundationError::NotImplemented(msg) if msg.contains("noop")));
    }

    #[test]
    fn handler_sees_configured_and_call_parameters() {
        let op = ParameterizedOperation::new("add", Parameters::new().with("base", 10))
            .with_handler(|configured, input| {
                let base = configured.get_integer("base").unwrap_or_default();
                let delta = input.get_integer("delta").unwrap_or_default();
                Ok(toml::Value::Integer(base + delta))
            });

        let out = op.call(Parameters::new().with("delta", 5)).unwrap();
        assert_eq!(out, toml::Value::Integer(15));
        assert_eq!(op.name(), "add");
    }
}
