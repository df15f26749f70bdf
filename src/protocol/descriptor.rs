//! Command and event descriptors.
//!
//! Descriptors declare the ordered field lists the wire format leaves
//! implicit: a command's reply field names and an event's parameter names.
//! Dispatch uses them to turn an open JSON mapping into positional
//! arguments in declared order.
//!
//! Every field is optional at extraction time: a name missing from the
//! mapping yields `Value::Null`, never an error. Peers routinely omit
//! fields they consider defaulted.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use super::message::ParamsMap;

// ============================================================================
// CommandDescriptor
// ============================================================================

/// Metadata for one command: its qualified name and the ordered list of
/// reply field names.
///
/// Callback-style completion extracts reply values from the response's
/// result mapping in exactly this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    method: String,
    reply_names: Vec<String>,
}

impl CommandDescriptor {
    /// Creates a command descriptor.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        reply_names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            method: method.into(),
            reply_names: reply_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the qualified command name (`Domain.method`).
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the declared reply field names in order.
    #[inline]
    #[must_use]
    pub fn reply_names(&self) -> &[String] {
        &self.reply_names
    }

    /// Extracts reply values from a result mapping in declared order.
    ///
    /// Missing names yield `Value::Null`.
    #[must_use]
    pub fn extract_reply(&self, result: &ParamsMap) -> Vec<Value> {
        extract_ordered(&self.reply_names, result)
    }
}

// ============================================================================
// EventDescriptor
// ============================================================================

/// Metadata for one event: the ordered list of its parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDescriptor {
    parameter_names: Vec<String>,
}

impl EventDescriptor {
    /// Creates an event descriptor.
    #[must_use]
    pub fn new(parameter_names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            parameter_names: parameter_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the declared parameter names in order.
    #[inline]
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Extracts event arguments from a params mapping in declared order.
    ///
    /// Missing names yield `Value::Null`.
    #[must_use]
    pub fn extract_arguments(&self, params: &ParamsMap) -> Vec<Value> {
        extract_ordered(&self.parameter_names, params)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Positional extraction shared by both descriptor kinds.
fn extract_ordered(names: &[String], map: &ParamsMap) -> Vec<Value> {
    names
        .iter()
        .map(|name| map.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

/// Splits a qualified `Domain.member` name.
///
/// Returns `None` when the name has no `.` separator or either side is
/// empty.
#[must_use]
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let (domain, member) = name.split_once('.')?;
    if domain.is_empty() || member.is_empty() {
        return None;
    }
    Some((domain, member))
}

// ============================================================================
// Tests
// ============================================================================
