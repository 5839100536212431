//! The analysed project: every parsed file plus the symbol table built
//! from them.
//!
//! [`Project::analyze`] is the whole pipeline.  It registers the override
//! table from every method declared in the project, matches each collected call
//! site to the method it invokes, evaluates the registered ones and
//! gathers the results into a [`Report`].

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::annotation::RETURN_TYPE_ARG_MARKER;
use crate::diagnostics::{CollectingSink, Diagnostic};
use crate::engine::{CallSite, OverrideTable};
use crate::names::ResolvedClassName;
use crate::parser::{ParsedFile, parse_php};
use crate::resolver::SymbolTable;
use crate::stubs;
use crate::types::{ClassInfo, ConstantValue, Location, MethodId, MethodInfo, UnionType};

/// Upper bound on the ancestors visited by one lookup.
const MAX_INHERITANCE_DEPTH: usize = 32;

#[derive(Debug, Clone)]
struct SourceFile {
    content: String,
    parsed: ParsedFile,
}

/// All files of one analysis, keyed by path or URI.
#[derive(Debug, Clone)]
pub struct Project {
    files: BTreeMap<String, SourceFile>,
    marker: String,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    pub fn new() -> Self {
        Self::with_marker(RETURN_TYPE_ARG_MARKER)
    }

    /// A project that looks for `marker` instead of `@returnTypeArg`.
    pub fn with_marker(marker: &str) -> Self {
        Self {
            files: BTreeMap::new(),
            marker: marker.to_string(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn set_marker(&mut self, marker: &str) {
        self.marker = marker.to_string();
    }

    /// Parse `content` and store it under `file`, replacing any previous
    /// version.
    pub fn add_file(&mut self, file: &str, content: &str) {
        let parsed = parse_php(file, content);
        self.files.insert(
            file.to_string(),
            SourceFile {
                content: content.to_string(),
                parsed,
            },
        );
    }

    pub fn remove_file(&mut self, file: &str) -> bool {
        self.files.remove(file).is_some()
    }

    pub fn contains_file(&self, file: &str) -> bool {
        self.files.contains_key(file)
    }

    pub fn content(&self, file: &str) -> Option<&str> {
        self.files.get(file).map(|f| f.content.as_str())
    }

    pub fn parsed(&self, file: &str) -> Option<&ParsedFile> {
        self.files.get(file).map(|f| &f.parsed)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> {
        self.files.values().flat_map(|f| f.parsed.classes.iter())
    }

    /// Project classes first, so that a workspace class shadows a
    /// built-in of the same name.
    pub fn symbols(&self) -> ProjectSymbols<'_> {
        let builtins: &[ClassInfo] = stubs::builtin_classes();
        ProjectSymbols::new(self.classes().chain(builtins))
    }

    /// Run the override over every call site in the project.
    pub fn analyze(&self) -> Report {
        let sink = CollectingSink::new();
        let symbols = self.symbols();
        // Only the declaration the symbol table resolves to is registered,
        // so a duplicate class cannot contribute its own parameter list.
        let table = OverrideTable::build_with_marker(
            self.classes()
                .filter(|c| symbols.is_declaration(c))
                .flat_map(|c| c.methods.iter()),
            &self.marker,
            &sink,
        );

        let mut inferences = Vec::new();
        if !table.is_empty() {
            for file in self.files.values() {
                for call in &file.parsed.calls {
                    let Some(method) = symbols.find_method(&call.class, &call.method) else {
                        continue;
                    };
                    let Some(spec) = table.get(&method.id) else {
                        continue;
                    };

                    let site = CallSite {
                        method: &method.id,
                        arguments: &call.arguments,
                        context: &call.context,
                        declared_return_type: &method.return_type,
                        location: &call.location,
                    };
                    if let Some(return_type) = table.override_return_type(&site, &symbols, &sink) {
                        inferences.push(Inference {
                            location: call.location.clone(),
                            method: method.id.clone(),
                            parameter: spec.parameter_name().to_string(),
                            declared: method.return_type.clone(),
                            return_type,
                        });
                    }
                }
            }
        }

        let report = Report::new(inferences, sink.into_diagnostics());
        tracing::debug!(
            files = self.files.len(),
            overrides = table.len(),
            inferences = report.inferences.len(),
            diagnostics = report.diagnostics.len(),
            "analysis finished"
        );
        report
    }
}

/// [`SymbolTable`] over a project's classes and the built-in classes.
///
/// When two files declare the same class, the first one (in file order)
/// wins.
pub struct ProjectSymbols<'p> {
    classes: HashMap<String, &'p ClassInfo>,
}

impl<'p> ProjectSymbols<'p> {
    pub fn new(classes: impl IntoIterator<Item = &'p ClassInfo>) -> Self {
        let mut map = HashMap::new();
        for class in classes {
            map.entry(class.fqn.lookup_key()).or_insert(class);
        }
        Self { classes: map }
    }

    pub fn class(&self, class: &ResolvedClassName) -> Option<&'p ClassInfo> {
        self.classes.get(&class.lookup_key()).copied()
    }

    /// Whether `class` is the declaration lookups of its name resolve to.
    pub fn is_declaration(&self, class: &ClassInfo) -> bool {
        self.class(&class.fqn)
            .is_some_and(|found| std::ptr::eq(found, class))
    }

    /// `class` followed by its ancestors, as far as they are known: the
    /// whole parent chain first, then the interfaces breadth-first.
    fn ancestry(&self, class: &ResolvedClassName) -> impl Iterator<Item = &'p ClassInfo> + '_ {
        let mut pending: VecDeque<&'p ClassInfo> = self.class(class).into_iter().collect();
        let mut seen = HashSet::new();
        std::iter::from_fn(move || {
            while seen.len() < MAX_INHERITANCE_DEPTH {
                let current = pending.pop_front()?;
                if !seen.insert(current.fqn.lookup_key()) {
                    continue;
                }
                if let Some(parent) = current.parent_class.as_ref().and_then(|p| self.class(p)) {
                    pending.push_front(parent);
                }
                pending.extend(current.interfaces.iter().filter_map(|i| self.class(i)));
                return Some(current);
            }
            None
        })
    }

    /// Find the method a call on `class` dispatches to, looking through
    /// parent classes and then interfaces.  Method names are
    /// case-insensitive.
    pub fn find_method(&self, class: &ResolvedClassName, name: &str) -> Option<&'p MethodInfo> {
        self.ancestry(class).find_map(|c| c.method(name))
    }
}

impl SymbolTable for ProjectSymbols<'_> {
    fn has_class(&self, class: &ResolvedClassName) -> bool {
        self.classes.contains_key(&class.lookup_key())
    }

    fn class_constant(&self, class: &ResolvedClassName, name: &str) -> Option<&ConstantValue> {
        self.ancestry(class)
            .find_map(|c| c.constant(name))
            .map(|c| &c.value)
    }
}

/// The return type computed for one call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inference {
    pub location: Location,
    pub method: MethodId,
    /// The designated parameter, without `$`.
    pub parameter: String,
    /// The method's declared return type.
    pub declared: UnionType,
    /// The call's type: the inferred class, or `declared` when inference
    /// failed.
    pub return_type: UnionType,
}

/// Result of [`Project::analyze`], sorted by file and offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub inferences: Vec<Inference>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(mut inferences: Vec<Inference>, mut diagnostics: Vec<Diagnostic>) -> Self {
        inferences.sort_by(|a, b| {
            (&a.location.file, a.location.start).cmp(&(&b.location.file, b.location.start))
        });
        diagnostics.sort_by(|a, b| {
            (&a.location.file, a.location.start, a.kind, &a.message).cmp(&(
                &b.location.file,
                b.location.start,
                b.kind,
                &b.message,
            ))
        });
        Self {
            inferences,
            diagnostics,
        }
    }

    pub fn diagnostics_for<'r>(&'r self, file: &'r str) -> impl Iterator<Item = &'r Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.location.file == file)
    }

    /// The innermost call site in `file` covering `offset`.
    pub fn inference_at(&self, file: &str, offset: u32) -> Option<&Inference> {
        self.inferences
            .iter()
            .filter(|i| i.location.file == file && i.location.contains(offset))
            .min_by_key(|i| i.location.end - i.location.start)
    }

    /// Every file that has at least one diagnostic.
    pub fn files_with_diagnostics(&self) -> impl Iterator<Item = &str> {
        let mut files: Vec<&str> = self
            .diagnostics
            .iter()
            .map(|d| d.location.file.as_str())
            .collect();
        files.dedup();
        files.into_iter()
    }
}
