use std::rc::Rc;

use super::{Resolver, ResolverKind};
use crate::container::{Container, ProviderNode};
use crate::descriptors::AnyValue;
use crate::error::{InjectError, InjectResult};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

/// A single scope-parameterized producer, invoked once per calling scope.
pub(crate) struct ScopeParamResolver {
    key: TypeKey,
    node: Rc<ProviderNode>,
    index: usize,
}

impl ScopeParamResolver {
    pub(crate) fn new(key: TypeKey, node: Rc<ProviderNode>, index: usize) -> Self {
        ScopeParamResolver { key, node, index }
    }
}

impl Resolver for ScopeParamResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::ScopeParameterized
    }

    fn type_key(&self) -> TypeKey {
        self.key
    }

    fn add_producer(&self, node: &Rc<ProviderNode>, _: usize) -> InjectResult<()> {
        Err(InjectError::DuplicateProvider {
            type_name: self.key.name(),
            location: node.location().clone(),
            existing: self.node.location().to_string(),
        })
    }

    fn resolve(&self, container: &Container, scope: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue> {
        let Some(scope) = scope else {
            return Err(InjectError::ScopeRequired {
                type_name: self.key.name(),
                caller: caller.to_string(),
            });
        };
        let value = container.output(&self.node, self.index, Some(scope))?;
        container.provided(self.key, self.node.location(), caller);
        Ok(value)
    }
}
