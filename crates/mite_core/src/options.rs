//! Compilation options.

use serde::{Deserialize, Serialize};

/// Name the whole render context is bound to by default.
pub const DEFAULT_LOCALS_NAME: &str = "locals";

/// Options controlling code generation and context binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Name the whole context is bound to inside directives.
    pub locals_name: String,
    /// Context keys bound as variables. `None` binds every top-level key.
    pub bindings: Option<Vec<String>>,
    /// Escape quotes and backslashes in literal text. Turning this off
    /// reproduces the historical output, where a `'` in literal text breaks
    /// the generated code.
    pub escape_literals: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            locals_name: DEFAULT_LOCALS_NAME.to_string(),
            bindings: None,
            escape_literals: true,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the whole context under `name`.
    pub fn with_locals_name(mut self, name: impl Into<String>) -> Self {
        self.locals_name = name.into();
        self
    }

    /// Add `name` to the binding allow-list, creating it if needed.
    pub fn with_binding(mut self, name: impl Into<String>) -> Self {
        self.bindings.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    /// Replace the binding allow-list.
    pub fn with_bindings<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bindings = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable escaping of literal text.
    pub fn escape_literals(mut self, enabled: bool) -> Self {
        self.escape_literals = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.locals_name, "locals");
        assert!(options.bindings.is_none());
        assert!(options.escape_literals);
    }

    #[test]
    fn test_builders() {
        let options = CompileOptions::new()
            .with_locals_name("data")
            .with_binding("user")
            .with_binding("items")
            .escape_literals(false);
        assert_eq!(options.locals_name, "data");
        assert_eq!(
            options.bindings,
            Some(vec!["user".to_string(), "items".to_string()])
        );
        assert!(!options.escape_literals);

        let options = options.with_bindings(["only"]);
        assert_eq!(options.bindings, Some(vec!["only".to_string()]));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let options: CompileOptions =
            serde_json::from_str(r#"{"bindings": ["a"]}"#).unwrap();
        assert_eq!(options.locals_name, "locals");
        assert_eq!(options.bindings, Some(vec!["a".to_string()]));
        assert!(options.escape_literals);
    }
}
