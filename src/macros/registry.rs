//! Macro registry for storage and lookup of macro definitions.
//!
//! # Macro Types
//! - **Function macros**: native Rust functions (not serializable).
//! - **Template macros**: serializable templates, usually read from `defmacro` forms.
//!
//! Names are case-sensitive. Overwriting an existing macro is silent unless
//! using the `*_or_error` methods.
//!
//! | Method                      | Overwrites | Error on Duplicate |
//! |-----------------------------|------------|--------------------|
//! | register                    | Yes        | No                 |
//! | register_or_error           | No         | Yes                |
//! | register_template           | Yes        | No                 |
//! | register_template_or_error  | No         | Yes                |
//!
//! # Serialization Example
//! ```rust
//! use symwalk::ast::Node;
//! use symwalk::macros::{MacroRegistry, MacroTemplate};
//! let mut reg = MacroRegistry::new();
//! let template = MacroTemplate::new(vec!["x".into()], None, Node::sym("x")).unwrap();
//! reg.register_template("identity", template);
//! let json = serde_json::to_string(&reg).unwrap();
//! let reg2: MacroRegistry = serde_json::from_str(&json).unwrap();
//! assert!(reg2.contains("identity"));
//! ```

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::macros::types::{MacroDef, MacroFn, MacroTemplate};
use crate::{err_msg, SymwalkError};

/// Macro definitions by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    pub macros: IndexMap<String, MacroDef>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts any definition, returning the one it replaced.
    pub fn insert(&mut self, name: &str, def: MacroDef) -> Option<MacroDef> {
        self.macros.insert(name.to_string(), def)
    }

    /// Registers a function macro, returning the one it replaced.
    ///
    /// # Example
    /// ```rust
    /// use symwalk::macros::{MacroRegistry, MacroFn};
    /// let mut reg = MacroRegistry::new();
    /// let my_macro_fn: MacroFn = |node, _| Ok(node.clone());
    /// assert!(reg.register("foo", my_macro_fn).is_none());
    /// assert!(reg.register("foo", my_macro_fn).is_some());
    /// ```
    pub fn register(&mut self, name: &str, func: MacroFn) -> Option<MacroDef> {
        self.insert(name, MacroDef::Fn(func))
    }

    /// Registers a function macro, failing if the name is taken.
    pub fn register_or_error(&mut self, name: &str, func: MacroFn) -> Result<(), SymwalkError> {
        self.insert_new(name, MacroDef::Fn(func))
    }

    /// Registers a template macro, returning the one it replaced.
    pub fn register_template(&mut self, name: &str, template: MacroTemplate) -> Option<MacroDef> {
        self.insert(name, MacroDef::Template(template))
    }

    /// Registers a template macro, failing if the name is taken.
    pub fn register_template_or_error(
        &mut self,
        name: &str,
        template: MacroTemplate,
    ) -> Result<(), SymwalkError> {
        self.insert_new(name, MacroDef::Template(template))
    }

    fn insert_new(&mut self, name: &str, def: MacroDef) -> Result<(), SymwalkError> {
        if self.macros.contains_key(name) {
            return Err(err_msg!(Macro, "macro '{}' is already registered", name));
        }
        self.macros.insert(name.to_string(), def);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<MacroDef> {
        self.macros.shift_remove(name)
    }

    pub fn lookup(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Macro names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.macros.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MacroDef)> {
        self.macros.iter()
    }

    pub fn clear(&mut self) {
        self.macros.clear();
    }
}

// ============================================================================
// SERIALIZATION SUPPORT
// ============================================================================

impl Serialize for MacroRegistry {
    /// Serializes template macros only; function pointers are skipped.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let templates: BTreeMap<&str, &MacroTemplate> = self
            .macros
            .iter()
            .filter_map(|(name, def)| match def {
                MacroDef::Template(template) => Some((name.as_str(), template)),
                MacroDef::Fn(_) => None,
            })
            .collect();

        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("MacroRegistry", 1)?;
        s.serialize_field("macros", &templates)?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for MacroRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct MacroRegistryHelper {
            macros: IndexMap<String, MacroTemplate>,
        }

        let helper = MacroRegistryHelper::deserialize(deserializer)?;
        let macros = helper
            .macros
            .into_iter()
            .map(|(name, template)| (name, MacroDef::Template(template)))
            .collect();

        Ok(MacroRegistry { macros })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn identity() -> MacroTemplate {
        MacroTemplate::new(vec!["x".into()], None, Node::sym("x")).unwrap()
    }

    #[test]
    fn or_error_variants_refuse_duplicates() {
        let mut reg = MacroRegistry::new();
        reg.register_template_or_error("m", identity()).unwrap();
        let err = reg.register_template_or_error("m", identity()).unwrap_err();
        assert!(err.message().contains("already registered"));
        let f: MacroFn = |node, _| Ok(node.clone());
        assert!(reg.register_or_error("m", f).is_err());
    }

    #[test]
    fn names_keep_registration_order() {
        let mut reg = MacroRegistry::new();
        for name in ["c", "a", "b"] {
            reg.register_template(name, identity());
        }
        reg.unregister("a");
        let names: Vec<&str> = reg.names().map(String::as_str).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn serialization_skips_function_macros() {
        let mut reg = MacroRegistry::new();
        let f: MacroFn = |node, _| Ok(node.clone());
        reg.register("native", f);
        reg.register_template("tmpl", identity());
        let json = serde_json::to_string(&reg).unwrap();
        assert!(json.contains("tmpl"));
        assert!(!json.contains("native"));
        let back: MacroRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
    }
}
