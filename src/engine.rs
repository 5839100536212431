//! The return-type override engine.
//!
//! Two phases:
//!
//! 1. **Build** ([`OverrideTable::build`]): every method's docblock is
//!    scanned once for `@returnTypeArg`.  Methods whose marker names a
//!    declared parameter get a [`MethodOverrideSpec`]; methods whose marker
//!    names an unknown parameter get one `UnknownParameter` diagnostic and
//!    nothing else.  Methods without a marker are left alone.
//!
//! 2. **Call sites** ([`OverrideTable::override_return_type`]): the
//!    designated argument is resolved to a class name, checked against the
//!    symbol table and returned as the call's type.  Any failure is
//!    reported as `NotInferable` and the declared return type is returned
//!    unchanged, so the override never loses information.
//!
//! The table is immutable after the build and holds no interior state,
//! so call sites may be evaluated concurrently.

use std::collections::HashMap;

use tracing::debug;

use crate::annotation::{RETURN_TYPE_ARG_MARKER, extract_with_marker};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::names::ResolutionContext;
use crate::resolver::{
    ArgumentExpr, CallArgument, InferenceFailure, SymbolTable, resolve_argument_to_class_name,
};
use crate::types::{Location, MethodId, MethodInfo, UnionType};

/// Which argument drives a method's return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodOverrideSpec {
    method: MethodId,
    parameter_index: usize,
    parameter_name: String,
}

impl MethodOverrideSpec {
    pub fn new(method: MethodId, parameter_index: usize, parameter_name: &str) -> Self {
        Self {
            method,
            parameter_index,
            parameter_name: parameter_name.to_string(),
        }
    }

    pub fn method(&self) -> &MethodId {
        &self.method
    }

    /// Zero-based position of the designated parameter.
    pub fn parameter_index(&self) -> usize {
        self.parameter_index
    }

    /// The designated parameter's name, without `$`.
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// Pick the designated argument: the positional argument at the
    /// recorded index, else a named argument with the parameter's name.
    pub fn select_argument<'a>(&self, arguments: &'a [CallArgument]) -> Option<&'a ArgumentExpr> {
        arguments
            .iter()
            .filter(|arg| arg.name.is_none())
            .nth(self.parameter_index)
            .or_else(|| {
                arguments
                    .iter()
                    .find(|arg| arg.name.as_deref() == Some(self.parameter_name.as_str()))
            })
            .map(|arg| &arg.value)
    }

    /// Infer the call's return type, or say why it cannot be inferred.
    pub fn infer<S: SymbolTable + ?Sized>(
        &self,
        arguments: &[CallArgument],
        context: &ResolutionContext,
        symbols: &S,
    ) -> Result<UnionType, InferenceFailure> {
        let argument = self
            .select_argument(arguments)
            .ok_or_else(|| InferenceFailure::unsupported("missing argument"))?;

        let class = resolve_argument_to_class_name(argument, context, symbols)?;
        if !symbols.has_class(&class) {
            return Err(InferenceFailure::ClassNotFound {
                class: class.to_string(),
            });
        }

        Ok(UnionType::from_class(&class))
    }

    /// [`infer`](Self::infer), with failures turned into a diagnostic and
    /// the declared return type.
    pub fn override_return_type<S: SymbolTable + ?Sized>(
        &self,
        arguments: &[CallArgument],
        context: &ResolutionContext,
        declared: &UnionType,
        symbols: &S,
        sink: &dyn DiagnosticSink,
        location: &Location,
    ) -> UnionType {
        match self.infer(arguments, context, symbols) {
            Ok(inferred) => inferred,
            Err(failure) => {
                sink.emit(Diagnostic::not_inferable(
                    &self.method,
                    &failure,
                    location.clone(),
                ));
                declared.clone()
            }
        }
    }
}

/// Everything the engine needs to know about one call.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    pub method: &'a MethodId,
    pub arguments: &'a [CallArgument],
    pub context: &'a ResolutionContext,
    pub declared_return_type: &'a UnionType,
    pub location: &'a Location,
}

/// Method identifier → override spec, built once per analysis.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    specs: HashMap<MethodId, MethodOverrideSpec>,
}

impl OverrideTable {
    /// Scan `methods` for the default `@returnTypeArg` marker.
    pub fn build<'a>(
        methods: impl IntoIterator<Item = &'a MethodInfo>,
        sink: &dyn DiagnosticSink,
    ) -> Self {
        Self::build_with_marker(methods, RETURN_TYPE_ARG_MARKER, sink)
    }

    /// Scan `methods` for a custom marker.
    pub fn build_with_marker<'a>(
        methods: impl IntoIterator<Item = &'a MethodInfo>,
        marker: &str,
        sink: &dyn DiagnosticSink,
    ) -> Self {
        let mut specs = HashMap::new();

        for method in methods {
            let Some(parameter_name) = extract_with_marker(method.docblock.as_deref(), marker)
            else {
                continue;
            };

            let Some(index) = method
                .parameters
                .iter()
                .position(|p| p.bare_name() == parameter_name)
            else {
                sink.emit(Diagnostic::unknown_parameter(
                    &parameter_name,
                    &method.id,
                    method.location.clone(),
                ));
                continue;
            };

            debug!(
                method = %method.id,
                parameter = %parameter_name,
                index,
                "registered return type override"
            );
            specs.insert(
                method.id.clone(),
                MethodOverrideSpec::new(method.id.clone(), index, &parameter_name),
            );
        }

        Self { specs }
    }

    pub fn get(&self, method: &MethodId) -> Option<&MethodOverrideSpec> {
        self.specs.get(method)
    }

    pub fn contains(&self, method: &MethodId) -> bool {
        self.specs.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodOverrideSpec> {
        self.specs.values()
    }

    /// The call's overridden return type, or `None` when the method has no
    /// override registered.
    pub fn override_return_type<S: SymbolTable + ?Sized>(
        &self,
        call: &CallSite<'_>,
        symbols: &S,
        sink: &dyn DiagnosticSink,
    ) -> Option<UnionType> {
        let spec = self.specs.get(call.method)?;
        Some(spec.override_return_type(
            call.arguments,
            call.context,
            call.declared_return_type,
            symbols,
            sink,
            call.location,
        ))
    }
}
