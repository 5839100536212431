//! Class name normalisation and namespace-aware resolution.
//!
//! PHP source refers to classes by short (`Foo`), qualified (`Sub\Foo`),
//! fully-qualified (`\App\Sub\Foo`) or relative (`namespace\Foo`) names,
//! plus the `self` / `static` / `parent` keywords.  This module turns those
//! tokens into a [`ResolvedClassName`] using the namespace and `use` imports
//! in effect at the point of reference ([`ResolutionContext`]).

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::util::short_name;

/// A fully-qualified class name that always starts with exactly one `\`.
///
/// Construction is idempotent: `ResolvedClassName::new("\\\\Foo")`,
/// `ResolvedClassName::new("\\Foo")` and `ResolvedClassName::new("Foo")`
/// all produce `\Foo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResolvedClassName(String);

impl ResolvedClassName {
    pub fn new(name: &str) -> Self {
        let trimmed = name.trim().trim_start_matches('\\');
        Self(format!("\\{}", trimmed))
    }

    /// Join a namespace (with or without separators) and a name relative
    /// to it.
    pub fn from_parts(namespace: Option<&str>, name: &str) -> Self {
        let name = name.trim_start_matches('\\');
        match namespace.map(|ns| ns.trim_matches('\\')) {
            Some(ns) if !ns.is_empty() => Self::new(&format!("{}\\{}", ns, name)),
            _ => Self::new(name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name without its leading separator (`App\Foo`).
    pub fn without_leading_separator(&self) -> &str {
        &self.0[1..]
    }

    /// The last segment of the name (`Foo` for `\App\Foo`).
    pub fn short_name(&self) -> &str {
        short_name(self.without_leading_separator())
    }

    /// The namespace part, if the class is not in the global namespace.
    pub fn namespace(&self) -> Option<&str> {
        let bare = self.without_leading_separator();
        bare.rfind('\\').map(|idx| &bare[..idx])
    }

    /// Case-folded key for symbol lookups.  PHP class names are
    /// case-insensitive.
    pub fn lookup_key(&self) -> String {
        self.without_leading_separator().to_ascii_lowercase()
    }
}

impl fmt::Display for ResolvedClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResolvedClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The namespace and import table in effect at a point in source.
///
/// Built once per namespace block by the parser and shared (behind an
/// `Arc`) by every call site inside it.  Import aliases are stored
/// case-folded because PHP resolves them case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
    namespace: Option<String>,
    /// Lower-cased alias → fully-qualified name without leading `\`.
    imports: HashMap<String, String>,
    enclosing_class: Option<ResolvedClassName>,
    parent_class: Option<ResolvedClassName>,
}

impl ResolutionContext {
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace
                .map(|ns| ns.trim_matches('\\').to_string())
                .filter(|ns| !ns.is_empty()),
            ..Self::default()
        }
    }

    /// Builder-style [`add_import`](Self::add_import).
    pub fn with_import(mut self, alias: &str, fqn: &str) -> Self {
        self.add_import(alias, fqn);
        self
    }

    /// Register `use {fqn} as {alias};`.
    pub fn add_import(&mut self, alias: &str, fqn: &str) {
        self.imports.insert(
            alias.to_ascii_lowercase(),
            fqn.trim_start_matches('\\').to_string(),
        );
    }

    /// The fully-qualified target of an imported alias (no leading `\`).
    pub fn import_for(&self, alias: &str) -> Option<&str> {
        self.imports
            .get(&alias.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn imports(&self) -> impl Iterator<Item = (&str, &str)> {
        self.imports.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A copy of this context scoped to a class body, so that `self`,
    /// `static` and `parent` can be resolved.
    pub fn with_enclosing_class(
        &self,
        class: ResolvedClassName,
        parent: Option<ResolvedClassName>,
    ) -> Self {
        Self {
            enclosing_class: Some(class),
            parent_class: parent,
            ..self.clone()
        }
    }

    pub fn enclosing_class(&self) -> Option<&ResolvedClassName> {
        self.enclosing_class.as_ref()
    }

    pub fn parent_class(&self) -> Option<&ResolvedClassName> {
        self.parent_class.as_ref()
    }

    /// Resolve a class name token as written in source.
    ///
    /// Returns `None` only for `self` / `static` / `parent` when the
    /// context has no enclosing (or parent) class.
    pub fn resolve_class_name(&self, token: &str) -> Option<ResolvedClassName> {
        let token = token.trim();

        if token.starts_with('\\') {
            return Some(ResolvedClassName::new(token));
        }

        match token.to_ascii_lowercase().as_str() {
            "self" | "static" => return self.enclosing_class.clone(),
            "parent" => return self.parent_class.clone(),
            _ => {}
        }

        // `namespace\Foo` is relative to the current namespace and
        // bypasses imports.
        if let Some(prefix) = token.get(..10)
            && prefix.eq_ignore_ascii_case("namespace\\")
        {
            return Some(ResolvedClassName::from_parts(
                self.namespace(),
                &token[10..],
            ));
        }

        let (first, rest) = match token.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (token, None),
        };

        if let Some(imported) = self.import_for(first) {
            return Some(match rest {
                Some(rest) => ResolvedClassName::new(&format!("{}\\{}", imported, rest)),
                None => ResolvedClassName::new(imported),
            });
        }

        Some(ResolvedClassName::from_parts(self.namespace(), token))
    }
}
