use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The eight BRP characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Attribute {
    Str,
    Con,
    Siz,
    Int,
    Pow,
    Dex,
    App,
    Edu,
}

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::Str,
        Attribute::Con,
        Attribute::Siz,
        Attribute::Int,
        Attribute::Pow,
        Attribute::Dex,
        Attribute::App,
        Attribute::Edu,
    ];

    pub fn abbrev(self) -> &'static str {
        match self {
            Attribute::Str => "STR",
            Attribute::Con => "CON",
            Attribute::Siz => "SIZ",
            Attribute::Int => "INT",
            Attribute::Pow => "POW",
            Attribute::Dex => "DEX",
            Attribute::App => "APP",
            Attribute::Edu => "EDU",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Attribute::Str => "strength",
            Attribute::Con => "constitution",
            Attribute::Siz => "size",
            Attribute::Int => "intelligence",
            Attribute::Pow => "power",
            Attribute::Dex => "dexterity",
            Attribute::App => "appearance",
            Attribute::Edu => "education",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbrev())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|a| a.abbrev().eq_ignore_ascii_case(s) || a.full_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown characteristic '{}'", s))
    }
}

/// Per-call variable bindings. Names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: IndexMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn canonical(name: &str) -> String {
        name.trim().to_ascii_lowercase()
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(Self::canonical(name), value.into());
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(&Self::canonical(name))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.set(k.as_ref(), v);
        }
        ctx
    }
}
