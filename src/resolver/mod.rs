//! Resolution strategies, one per registered type key.
//!
//! Every type the container knows about has exactly one resolver. The
//! resolver decides how producers attach to it and how a consumer's request
//! is answered:
//!
//! * [`SingularResolver`]: one producer, one memoized value.
//! * [`ScopeParamResolver`]: one scope-parameterized producer, one value per calling scope.
//! * [`GroupResolver`]: any number of producers, consumed as `Vec<T>` through [`SequenceResolver`].
//! * [`PerScopeResolver`]: one producer per scope, consumed as `HashMap<Scope, T>` through [`MapResolver`].

use std::fmt;
use std::rc::Rc;

use crate::container::{Container, ProviderNode};
use crate::descriptors::AnyValue;
use crate::error::InjectResult;
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

mod group;
mod per_scope;
mod scope_param;
mod singular;

pub(crate) use group::{GroupResolver, SequenceResolver};
pub(crate) use per_scope::{MapResolver, PerScopeResolver};
pub(crate) use scope_param::ScopeParamResolver;
pub(crate) use singular::SingularResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolverKind {
    Singular,
    ScopeParameterized,
    Group,
    Sequence,
    PerScope,
    ScopeMap,
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolverKind::Singular => "simple",
            ResolverKind::ScopeParameterized => "scope-parameterized",
            ResolverKind::Group => "auto-group",
            ResolverKind::Sequence => "auto-group sequence",
            ResolverKind::PerScope => "per-scope",
            ResolverKind::ScopeMap => "per-scope map",
        })
    }
}

/// Core resolver trait, object-safe so the registry can hold `Rc<dyn Resolver>`.
pub(crate) trait Resolver {
    fn kind(&self) -> ResolverKind;

    /// Key this resolver is registered under.
    fn type_key(&self) -> TypeKey;

    /// Element type behind a sequence or map view.
    fn element_key(&self) -> Option<TypeKey> {
        None
    }

    /// Attaches output `index` of `node` as a producer.
    fn add_producer(&self, node: &Rc<ProviderNode>, index: usize) -> InjectResult<()>;

    /// Answers a request from `caller`, made while resolving inside `scope`.
    fn resolve(&self, container: &Container, scope: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue>;
}

/// Producer output slot key, for nodes already validated by the registry.
pub(crate) fn output_key(node: &ProviderNode, index: usize) -> Option<TypeKey> {
    node.descriptor().outputs().get(index).map(|slot| slot.key())
}
