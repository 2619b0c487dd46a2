//! Generator configuration.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Name of the registrar method route decorators are rewritten to.
pub const DEFAULT_REGISTRAR: &str = "__register";

/// Words the host script reserves or the generated code relies on. A source
/// name spelled like one of these is emitted with a trailing underscore.
pub const HOST_RESERVED_WORDS: &[&str] = &[
    "Math",
    "class",
    "console",
    "else",
    "false",
    "for",
    "function",
    "if",
    "new",
    "null",
    "return",
    "static",
    "this",
    "true",
    "undefined",
    "var",
    "while",
];

/// Tables the generator consults while lowering calls and decorators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Callee names that are constructed with `new` (e.g. `Conduit`).
    pub framework_classes: BTreeSet<String>,
    /// Source name → host script name (e.g. `print` → `console.log`).
    pub builtin_renames: BTreeMap<String, String>,
    /// Source names that must not reach the host script unchanged.
    pub reserved_words: BTreeSet<String>,
    /// Method invoked on a decorator's target object.
    pub registrar: String,
    /// One indentation step in the emitted text.
    pub indent: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let mut builtin_renames = BTreeMap::new();
        builtin_renames.insert("print".to_string(), "console.log".to_string());
        Self {
            framework_classes: BTreeSet::new(),
            builtin_renames,
            reserved_words: HOST_RESERVED_WORDS.iter().map(|w| w.to_string()).collect(),
            registrar: DEFAULT_REGISTRAR.to_string(),
            indent: "  ".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Add framework class names to the `new` table.
    pub fn with_framework_classes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.framework_classes
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn is_framework_class(&self, name: &str) -> bool {
        self.framework_classes.contains(name)
    }

    /// The host script spelling of a name the program binds: a variable,
    /// parameter, function or class.
    pub fn binding<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.reserved_words.contains(name) {
            Cow::Owned(format!("{name}_"))
        } else {
            Cow::Borrowed(name)
        }
    }

    /// The host script spelling of an identifier read in an expression.
    /// Builtins are renamed; everything else follows [`Self::binding`].
    pub fn rename<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        match self.builtin_renames.get(name) {
            Some(host) => Cow::Borrowed(host.as_str()),
            None => self.binding(name),
        }
    }
}
