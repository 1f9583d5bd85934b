use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::Dice;
use crate::context::Context;
use crate::expr::{EvalError, Scope, eval};
use crate::rules::{Rule, RuleRegistry};
use crate::value::Value;

/// A recoverable problem met while resolving a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RuleNotFound { rule_id: String },
    /// The variable was bound to 0 and resolution continued.
    MissingVariable { rule_id: String, name: String },
    FormulaEvaluation { rule_id: String, error: EvalError },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RuleNotFound { rule_id } => write!(f, "rule '{}' not found", rule_id),
            Diagnostic::MissingVariable { rule_id, name } => {
                write!(f, "variable '{}' missing for rule '{}'; using 0", name, rule_id)
            }
            Diagnostic::FormulaEvaluation { rule_id, error } => {
                write!(f, "calculation error in rule '{}': {}", rule_id, error)
            }
        }
    }
}

/// What resolving a rule produced: a value (or nothing) plus diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub rule_id: String,
    pub value: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }

    pub fn rule_found(&self) -> bool {
        !self.diagnostics.iter().any(|d| matches!(d, Diagnostic::RuleNotFound { .. }))
    }

    pub fn error(&self) -> Option<&EvalError> {
        self.diagnostics.iter().find_map(|d| match d {
            Diagnostic::FormulaEvaluation { error, .. } => Some(error),
            _ => None,
        })
    }

    pub fn missing_variables(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::MissingVariable { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Numeric result, if the rule produced a number.
    pub fn number(&self) -> Option<f64> {
        self.value.as_ref().filter(|v| v.is_number() || matches!(v, Value::Bool(_)))?.as_f64()
    }

    /// Numeric result, with anything else coerced to 0.
    pub fn number_or_zero(&self) -> f64 {
        self.number().unwrap_or(0.0)
    }

    pub fn text(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

/// Resolves rule ids against a variable context.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    registry: RuleRegistry,
}

impl Resolver {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.registry.get(id)
    }

    /// Resolve `rule_id` against `context`.
    ///
    /// Never fails: an unknown rule yields no value, missing inputs are bound
    /// to 0, and evaluation errors come back as a diagnostic with no value.
    pub fn resolve(&self, rule_id: &str, context: &Context, dice: &mut Dice) -> Resolution {
        let mut diagnostics = Vec::new();

        let Some(entry) = self.registry.entry(rule_id) else {
            warn!(rule = rule_id, "rule not found");
            diagnostics.push(Diagnostic::RuleNotFound { rule_id: rule_id.to_string() });
            return Resolution { rule_id: rule_id.to_string(), value: None, diagnostics };
        };
        let rule = &entry.rule;

        let Some(compiled) = &entry.compiled else {
            let value = rule.data_table.clone().or_else(|| rule.description.clone().map(Value::Str));
            return Resolution { rule_id: rule_id.to_string(), value, diagnostics };
        };

        let mut bound: IndexMap<String, Value> = IndexMap::with_capacity(rule.input_variables.len());
        let mut missing = Vec::new();
        for name in &rule.input_variables {
            let value = match context.get(name) {
                Some(v) if *v != Value::Null => v.clone(),
                _ => {
                    missing.push(name.as_str());
                    diagnostics.push(Diagnostic::MissingVariable {
                        rule_id: rule_id.to_string(),
                        name: name.clone(),
                    });
                    Value::Int(0)
                }
            };
            bound.insert(Context::canonical(name), value);
        }
        if !missing.is_empty() {
            warn!(rule = rule_id, ?missing, "variables missing; using 0");
        }

        let result = match compiled {
            Ok(expr) => eval(expr, &Scope::new(&bound, rule.data_table.as_ref()), dice),
            Err(parse) => Err(EvalError::Parse(parse.clone())),
        };
        let value = match result {
            Ok(value) => {
                debug!(rule = rule_id, %value, "resolved");
                Some(value)
            }
            Err(error) => {
                warn!(rule = rule_id, %error, "calculation error");
                diagnostics.push(Diagnostic::FormulaEvaluation { rule_id: rule_id.to_string(), error });
                None
            }
        };
        Resolution { rule_id: rule_id.to_string(), value, diagnostics }
    }
}
