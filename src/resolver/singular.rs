use std::rc::Rc;

use super::{Resolver, ResolverKind};
use crate::container::{Container, ProviderNode};
use crate::descriptors::AnyValue;
use crate::error::{InjectError, InjectResult};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

/// One producer, invoked at most once.
pub(crate) struct SingularResolver {
    key: TypeKey,
    node: Rc<ProviderNode>,
    index: usize,
}

impl SingularResolver {
    pub(crate) fn new(key: TypeKey, node: Rc<ProviderNode>, index: usize) -> Self {
        SingularResolver { key, node, index }
    }
}

impl Resolver for SingularResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Singular
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

    // plain producers resolve in their own scope, whoever asks
    fn resolve(&self, container: &Container, _: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue> {
        let value = container.output(&self.node, self.index, None)?;
        container.provided(self.key, self.node.location(), caller);
        Ok(value)
    }
}
