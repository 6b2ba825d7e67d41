//! Field coercion, range validation and type-forced values
//!
//! Incoming values are untyped (form text or numbers). They are resolved
//! against a base set of fields, range-checked, and finally forced to the
//! values their node type dictates.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::domain::entities::NodeType;

pub const DEFAULT_NODE_NAME: &str = "New Node";
pub const EXIT_NODE_NAME: &str = "Exit";

/// A number as entered by a user: either already numeric or raw text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl From<f64> for RawNumber {
    fn from(v: f64) -> Self {
        RawNumber::Number(v)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        RawNumber::Text(s.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(s: String) -> Self {
        RawNumber::Text(s)
    }
}

/// Outcome of coercing one raw number.
enum Coerced {
    Unset,
    Value(f64),
    Invalid(String),
}

impl RawNumber {
    fn coerce(&self) -> Coerced {
        match self {
            RawNumber::Number(v) if v.is_finite() => Coerced::Value(*v),
            RawNumber::Number(v) => Coerced::Invalid(v.to_string()),
            RawNumber::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Coerced::Unset;
                }
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => Coerced::Value(v),
                    _ => Coerced::Invalid(s.clone()),
                }
            }
        }
    }
}

/// Raw, unvalidated field input for add and edit.
///
/// `None` means "not provided": add falls back to type defaults, edit keeps
/// the node's current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawFields {
    pub name: Option<String>,
    pub probability: Option<RawNumber>,
    pub cost: Option<RawNumber>,
    pub time: Option<RawNumber>,
}

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn probability(mut self, value: impl Into<RawNumber>) -> Self {
        self.probability = Some(value.into());
        self
    }

    pub fn cost(mut self, value: impl Into<RawNumber>) -> Self {
        self.cost = Some(value.into());
        self
    }

    pub fn time(mut self, value: impl Into<RawNumber>) -> Self {
        self.time = Some(value.into());
        self
    }

    /// Coerce and validate against `base`, then apply the forced values of `node_type`.
    ///
    /// Every violated field is reported; nothing is returned partially.
    /// Unparsable `time` counts as 0, unparsable probability or cost is an error.
    #[instrument(level = "trace", skip(self, base))]
    pub fn resolve(&self, node_type: NodeType, base: &NodeFields) -> Result<NodeFields, FieldErrors> {
        let mut errors = FieldErrors::default();

        let probability = match self.probability.as_ref().map(RawNumber::coerce) {
            None | Some(Coerced::Unset) => base.probability,
            Some(Coerced::Value(v)) => v,
            Some(Coerced::Invalid(value)) => {
                errors.push(FieldError::NotANumber {
                    field: "probability",
                    value,
                });
                base.probability
            }
        };
        let cost = match self.cost.as_ref().map(RawNumber::coerce) {
            None | Some(Coerced::Unset) => base.cost,
            Some(Coerced::Value(v)) => v,
            Some(Coerced::Invalid(value)) => {
                errors.push(FieldError::NotANumber {
                    field: "cost",
                    value,
                });
                base.cost
            }
        };
        let time = match self.time.as_ref().map(RawNumber::coerce) {
            None | Some(Coerced::Unset) => base.time,
            Some(Coerced::Value(v)) => v,
            Some(Coerced::Invalid(_)) => 0.0,
        };

        if !(0.0..=1.0).contains(&probability) {
            errors.push(FieldError::ProbabilityRange(probability));
        }
        if cost < 0.0 {
            errors.push(FieldError::CostRange(cost));
        }
        if time < 0.0 {
            errors.push(FieldError::TimeRange(time));
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let name = match self.name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => base.name.clone(),
        };

        Ok(NodeFields {
            name,
            probability,
            cost,
            time,
        }
        .forced(node_type))
    }
}

/// Validated, user-editable node fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFields {
    pub name: String,
    pub probability: f64,
    pub cost: f64,
    pub time: f64,
}

impl NodeFields {
    /// Defaults for a new node of `node_type`.
    ///
    /// A first child gets probability 1, later siblings 0.
    pub fn defaults_for(node_type: NodeType, has_siblings: bool) -> Self {
        let probability = if node_type == NodeType::Decision || !has_siblings {
            1.0
        } else {
            0.0
        };
        Self {
            name: DEFAULT_NODE_NAME.to_string(),
            probability,
            cost: 0.0,
            time: default_time(node_type),
        }
        .forced(node_type)
    }

    /// Apply the values `node_type` dictates regardless of input.
    pub fn forced(mut self, node_type: NodeType) -> Self {
        match node_type {
            NodeType::Start => {
                self.cost = 0.0;
                self.probability = 1.0;
                self.time = 0.0;
            }
            NodeType::Decision => {
                self.probability = 1.0;
            }
            NodeType::Exit => {
                self.name = EXIT_NODE_NAME.to_string();
                self.time = 0.0;
            }
            NodeType::Action | NodeType::Outcome => {}
        }
        self
    }
}

/// Time assumed for a new node when none is given.
pub fn default_time(node_type: NodeType) -> f64 {
    match node_type {
        NodeType::Decision => 1.0,
        NodeType::Action => 2.0,
        NodeType::Start | NodeType::Outcome | NodeType::Exit => 0.0,
    }
}

/// A single field-range violation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("probability must be between 0 and 1, got {0}")]
    ProbabilityRange(f64),

    #[error("cost must not be negative, got {0}")]
    CostRange(f64),

    #[error("time must not be negative, got {0}")]
    TimeRange(f64),

    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },
}

/// All violations found while validating one set of fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn has_probability_error(&self) -> bool {
        self.0.iter().any(|e| {
            matches!(
                e,
                FieldError::ProbabilityRange(_) | FieldError::NotANumber { field: "probability", .. }
            )
        })
    }

    pub fn has_cost_error(&self) -> bool {
        self.0.iter().any(|e| {
            matches!(
                e,
                FieldError::CostRange(_) | FieldError::NotANumber { field: "cost", .. }
            )
        })
    }

    pub fn has_time_error(&self) -> bool {
        self.0.iter().any(|e| matches!(e, FieldError::TimeRange(_)))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn action_base() -> NodeFields {
        NodeFields::defaults_for(NodeType::Action, false)
    }

    #[test]
    fn given_all_fields_out_of_range_when_resolving_then_reports_every_violation() {
        let raw = RawFields::new().probability(1.5).cost(-1.0).time(-2.0);

        let errors = raw.resolve(NodeType::Action, &action_base()).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.has_probability_error());
        assert!(errors.has_cost_error());
        assert!(errors.has_time_error());
    }

    #[test]
    fn given_text_numbers_when_resolving_then_parses_them() {
        let raw = RawFields::new().probability(" 0.25 ").cost("10").time("3.5");

        let fields = raw.resolve(NodeType::Outcome, &action_base()).unwrap();

        assert_eq!(fields.probability, 0.25);
        assert_eq!(fields.cost, 10.0);
        assert_eq!(fields.time, 3.5);
    }

    #[test]
    fn given_unparsable_time_when_resolving_then_treats_as_zero() {
        let raw = RawFields::new().time("soon");

        let fields = raw.resolve(NodeType::Action, &action_base()).unwrap();

        assert_eq!(fields.time, 0.0);
    }

    #[test]
    fn given_unparsable_cost_when_resolving_then_errors() {
        let raw = RawFields::new().cost("cheap");

        let errors = raw.resolve(NodeType::Action, &action_base()).unwrap_err();

        assert!(errors.has_cost_error());
        assert!(!errors.has_probability_error());
    }

    #[test]
    fn given_missing_fields_when_resolving_then_keeps_base() {
        let base = NodeFields {
            name: "Keep".to_string(),
            probability: 0.4,
            cost: 7.0,
            time: 2.0,
        };

        let fields = RawFields::new().resolve(NodeType::Action, &base).unwrap();

        assert_eq!(fields, base);
    }

    #[test]
    fn given_blank_name_when_resolving_then_keeps_base_name() {
        let fields = RawFields::new()
            .name("   ")
            .resolve(NodeType::Action, &action_base())
            .unwrap();
        assert_eq!(fields.name, DEFAULT_NODE_NAME);
    }

    #[test]
    fn given_start_node_when_resolving_then_forces_zero_cost_and_time() {
        let raw = RawFields::new().name("Begin").probability(0.3).cost(5.0).time(4.0);
        let base = NodeFields::defaults_for(NodeType::Start, false);

        let fields = raw.resolve(NodeType::Start, &base).unwrap();

        assert_eq!(fields.name, "Begin");
        assert_eq!(fields.probability, 1.0);
        assert_eq!(fields.cost, 0.0);
        assert_eq!(fields.time, 0.0);
    }

    #[test]
    fn given_exit_node_when_resolving_then_forces_name_and_time() {
        let raw = RawFields::new().name("Leave").time(9.0).cost(3.0);
        let base = NodeFields::defaults_for(NodeType::Exit, false);

        let fields = raw.resolve(NodeType::Exit, &base).unwrap();

        assert_eq!(fields.name, EXIT_NODE_NAME);
        assert_eq!(fields.time, 0.0);
        assert_eq!(fields.cost, 3.0);
    }

    #[test]
    fn given_decision_with_probability_out_of_range_when_resolving_then_still_rejected() {
        let raw = RawFields::new().probability(1.5);
        let base = NodeFields::defaults_for(NodeType::Decision, false);

        let errors = raw.resolve(NodeType::Decision, &base).unwrap_err();

        assert!(errors.has_probability_error());
    }

    #[rstest]
    #[case(NodeType::Start, 0.0)]
    #[case(NodeType::Decision, 1.0)]
    #[case(NodeType::Action, 2.0)]
    #[case(NodeType::Outcome, 0.0)]
    #[case(NodeType::Exit, 0.0)]
    fn given_node_type_when_defaulting_time_then_uses_type_default(
        #[case] node_type: NodeType,
        #[case] expected: f64,
    ) {
        assert_eq!(NodeFields::defaults_for(node_type, false).time, expected);
    }

    #[rstest]
    #[case(NodeType::Outcome, false, 1.0)]
    #[case(NodeType::Outcome, true, 0.0)]
    #[case(NodeType::Decision, true, 1.0)]
    fn given_sibling_state_when_defaulting_probability_then_first_child_gets_one(
        #[case] node_type: NodeType,
        #[case] has_siblings: bool,
        #[case] expected: f64,
    ) {
        assert_eq!(
            NodeFields::defaults_for(node_type, has_siblings).probability,
            expected
        );
    }

    #[test]
    fn given_field_errors_when_displaying_then_joins_messages() {
        let mut errors = FieldErrors::default();
        errors.push(FieldError::CostRange(-1.0));
        errors.push(FieldError::TimeRange(-2.0));
        assert_eq!(
            errors.to_string(),
            "cost must not be negative, got -1; time must not be negative, got -2"
        );
    }
}
