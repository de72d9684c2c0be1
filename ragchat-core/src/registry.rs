//! Startup resolution of role implementations.
//!
//! Applications register implementations under a `(module, function)`
//! binding. At startup each [`Role`] is resolved once: first the explicit
//! override from [`ResolverConfig`], then the role's conventional bindings
//! in order. A role that resolves to nothing is bound to its built-in
//! fallback. Lookup misses are logged and never surface as errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragchat_core::{ProviderRegistry, ResolvedRoles, ResolverConfig};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register_retriever("rag", "retrieve", Arc::new(MyRetriever::new()));
//!
//! let roles = ResolvedRoles::resolve(&registry, &ResolverConfig::from_env());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::config::{ResolverConfig, RoleOverride};
use crate::generator::StubGenerator;
use crate::lexical::LexicalRetriever;
use crate::prompt::TemplatePromptBuilder;
use crate::role::{Generator, PromptBuilder, Retriever, Role};

/// A `(module, function)` pair an implementation is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub module: String,
    pub function: String,
}

impl Binding {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self { module: module.into(), function: function.into() }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.function)
    }
}

/// Outcome of resolving one role.
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    Available { binding: Binding, implementation: T },
    Unavailable,
}

impl<T> Resolution<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Resolution::Available { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupMiss {
    UnknownModule,
    UnknownFunction,
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupMiss::UnknownModule => f.write_str("module not registered"),
            LookupMiss::UnknownFunction => f.write_str("function not found in module"),
        }
    }
}

/// Implementations of one role, keyed by module then function.
struct Slot<T> {
    modules: HashMap<String, HashMap<String, T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self { modules: HashMap::new() }
    }
}

impl<T: Clone> Slot<T> {
    fn insert(&mut self, module: String, function: String, implementation: T) {
        self.modules.entry(module).or_default().insert(function, implementation);
    }

    fn lookup(&self, module: &str, function: &str) -> Result<T, LookupMiss> {
        let functions = self.modules.get(module).ok_or(LookupMiss::UnknownModule)?;
        functions.get(function).cloned().ok_or(LookupMiss::UnknownFunction)
    }

    fn resolve(&self, role: Role, role_override: &RoleOverride) -> Resolution<T> {
        let explicit = role_override.binding(role);
        if let Some((module, function)) = explicit {
            debug!(%role, module, function, "trying explicit override");
        }

        let conventions: &[(&str, &str)] = role.conventions();
        for (module, function) in explicit.into_iter().chain(conventions.iter().copied()) {
            match self.lookup(module, function) {
                Ok(implementation) => {
                    return Resolution::Available {
                        binding: Binding::new(module, function),
                        implementation,
                    };
                }
                Err(miss) => debug!(%role, module, function, reason = %miss, "binding unavailable"),
            }
        }
        Resolution::Unavailable
    }
}

/// Implementations available for resolution, registered by the embedding
/// application before the server starts.
#[derive(Default)]
pub struct ProviderRegistry {
    retrievers: Slot<Arc<dyn Retriever>>,
    prompt_builders: Slot<Arc<dyn PromptBuilder>>,
    generators: Slot<Arc<dyn Generator>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_retriever(
        &mut self,
        module: impl Into<String>,
        function: impl Into<String>,
        retriever: Arc<dyn Retriever>,
    ) -> &mut Self {
        self.retrievers.insert(module.into(), function.into(), retriever);
        self
    }

    pub fn register_prompt_builder(
        &mut self,
        module: impl Into<String>,
        function: impl Into<String>,
        builder: Arc<dyn PromptBuilder>,
    ) -> &mut Self {
        self.prompt_builders.insert(module.into(), function.into(), builder);
        self
    }

    pub fn register_generator(
        &mut self,
        module: impl Into<String>,
        function: impl Into<String>,
        generator: Arc<dyn Generator>,
    ) -> &mut Self {
        self.generators.insert(module.into(), function.into(), generator);
        self
    }

    pub fn resolve_retriever(&self, role_override: &RoleOverride) -> Resolution<Arc<dyn Retriever>> {
        self.retrievers.resolve(Role::Retriever, role_override)
    }

    pub fn resolve_prompt_builder(
        &self,
        role_override: &RoleOverride,
    ) -> Resolution<Arc<dyn PromptBuilder>> {
        self.prompt_builders.resolve(Role::PromptBuilder, role_override)
    }

    pub fn resolve_generator(&self, role_override: &RoleOverride) -> Resolution<Arc<dyn Generator>> {
        self.generators.resolve(Role::Generator, role_override)
    }
}

/// Where a role's implementation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Resolved(Binding),
    Fallback,
}

impl Source {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Source::Fallback)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Resolved(binding) => binding.fmt(f),
            Source::Fallback => f.write_str("fallback"),
        }
    }
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An implementation together with its [`Source`].
#[derive(Clone)]
pub struct Bound<T> {
    pub implementation: T,
    pub source: Source,
}

fn bind<T>(role: Role, resolution: Resolution<T>, fallback: impl FnOnce() -> T) -> Bound<T> {
    let bound = match resolution {
        Resolution::Available { binding, implementation } => {
            Bound { implementation, source: Source::Resolved(binding) }
        }
        Resolution::Unavailable => Bound { implementation: fallback(), source: Source::Fallback },
    };
    info!(%role, source = %bound.source, "role bound");
    bound
}

/// The role bindings used for the lifetime of the process.
#[derive(Clone)]
pub struct ResolvedRoles {
    pub retriever: Bound<Arc<dyn Retriever>>,
    pub prompt_builder: Bound<Arc<dyn PromptBuilder>>,
    pub generator: Bound<Arc<dyn Generator>>,
}

/// Serializable summary of [`ResolvedRoles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleSources {
    pub retriever: Source,
    pub prompt_builder: Source,
    pub generator: Source,
}

impl ResolvedRoles {
    /// Resolve every role against `registry`, binding fallbacks where
    /// nothing resolves.
    pub fn resolve(registry: &ProviderRegistry, config: &ResolverConfig) -> Self {
        Self {
            retriever: bind(
                Role::Retriever,
                registry.resolve_retriever(&config.retriever),
                || Arc::new(LexicalRetriever::default()) as Arc<dyn Retriever>,
            ),
            prompt_builder: bind(
                Role::PromptBuilder,
                registry.resolve_prompt_builder(&config.prompt_builder),
                || Arc::new(TemplatePromptBuilder) as Arc<dyn PromptBuilder>,
            ),
            generator: bind(
                Role::Generator,
                registry.resolve_generator(&config.generator),
                || Arc::new(StubGenerator) as Arc<dyn Generator>,
            ),
        }
    }

    /// Bind every role to its built-in fallback.
    pub fn fallbacks() -> Self {
        Self::resolve(&ProviderRegistry::new(), &ResolverConfig::default())
    }

    pub fn sources(&self) -> RoleSources {
        RoleSources {
            retriever: self.retriever.source.clone(),
            prompt_builder: self.prompt_builder.source.clone(),
            generator: self.generator.source.clone(),
        }
    }
}
