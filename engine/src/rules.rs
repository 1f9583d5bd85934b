use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::expr::{Expr, ParseError, compile};
use crate::source::RuleSource;
use crate::value::Value;

/// One named rule: a formula, a data table, or both.
///
/// Keys a rule file carries beyond the known ones (weapon `damage`,
/// `category`, armor `armor_points`, ...) are kept in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRule")]
pub struct Rule {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub input_variables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_table: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub metadata: IndexMap<String, Value>,
    /// Set when the file held a `formula` that is not text or a number.
    #[serde(skip)]
    formula_error: Option<String>,
}

impl Rule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            formula: None,
            input_variables: Vec::new(),
            data_table: None,
            description: None,
            metadata: IndexMap::new(),
            formula_error: None,
        }
    }

    pub fn with_formula<S: Into<String>>(mut self, formula: &str, inputs: impl IntoIterator<Item = S>) -> Self {
        self.formula = Some(formula.to_string());
        self.formula_error = None;
        self.input_variables = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_table(mut self, table: Value) -> Self {
        self.data_table = Some(table);
        self
    }

    pub fn with_description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn category(&self) -> Option<&str> {
        self.meta("category").and_then(Value::as_str)
    }
}

/// On-disk shape: accepts both flat `formula`/`input_variables` and the
/// nested `logic: { formula, input_variables }` form.
#[derive(Deserialize)]
struct RawRule {
    id: String,
    #[serde(default, alias = "base_formula")]
    formula: Option<Value>,
    #[serde(default)]
    input_variables: Option<Vec<String>>,
    #[serde(default)]
    logic: Option<RawLogic>,
    #[serde(default)]
    data_table: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    metadata: IndexMap<String, Value>,
}

#[derive(Deserialize)]
struct RawLogic {
    #[serde(default)]
    formula: Option<Value>,
    #[serde(default)]
    input_variables: Vec<String>,
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        let (logic_formula, logic_inputs) = match raw.logic {
            Some(logic) => (logic.formula, logic.input_variables),
            None => (None, Vec::new()),
        };
        let (formula, formula_error) = match raw.formula.or(logic_formula) {
            None | Some(Value::Null) => (None, None),
            Some(Value::Str(text)) => (Some(text).filter(|f| !f.trim().is_empty()), None),
            Some(n @ (Value::Int(_) | Value::Float(_))) => (Some(n.to_string()), None),
            Some(other) => {
                let msg = format!("formula must be text or a number, found {}", other.type_name());
                (Some(other.to_string()), Some(msg))
            }
        };
        Rule {
            id: raw.id,
            formula,
            input_variables: raw.input_variables.unwrap_or(logic_inputs),
            data_table: raw.data_table,
            description: raw.description,
            metadata: raw.metadata,
            formula_error,
        }
    }
}

/// A registered rule with its formula compiled once up front.
#[derive(Debug, Clone)]
pub(crate) struct RuleEntry {
    pub rule: Rule,
    pub compiled: Option<Result<Expr, ParseError>>,
}

/// Immutable map from rule id to rule, built once and read many times.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    entries: IndexMap<String, RuleEntry>,
}

impl RuleRegistry {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for rule in rules {
            registry.insert(rule, "memory")?;
        }
        Ok(registry)
    }

    /// Merge every source, in order. Rule ids must be unique across sources.
    pub fn load(sources: &[&dyn RuleSource]) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for source in sources {
            let origin = source.name();
            let rules = source.load()?;
            debug!(source = %origin, rules = rules.len(), "loaded rule source");
            for rule in rules {
                registry.insert(rule, &origin)?;
            }
        }
        Ok(registry)
    }

    fn insert(&mut self, rule: Rule, origin: &str) -> Result<(), RegistryError> {
        if self.entries.contains_key(&rule.id) {
            return Err(RegistryError::DuplicateRule { id: rule.id, origin: origin.to_string() });
        }
        let compiled = rule.formula.as_deref().map(|text| {
            let parsed = match &rule.formula_error {
                Some(msg) => Err(ParseError::new(msg.as_str(), 0)),
                None => compile(text),
            };
            if let Err(err) = &parsed {
                warn!(rule = %rule.id, %err, "formula does not parse; resolving it will report an error");
            }
            parsed
        });
        self.entries.insert(rule.id.clone(), RuleEntry { rule, compiled });
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.entries.get(id).map(|e| &e.rule)
    }

    pub(crate) fn entry(&self, id: &str) -> Option<&RuleEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.entries.values().map(|e| &e.rule)
    }
}
