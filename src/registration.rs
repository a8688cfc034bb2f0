//! Type key to resolver table.

use std::rc::Rc;

use crate::container::ProviderNode;
use crate::debug::DebugSink;
use crate::error::{InjectError, InjectResult};
use crate::graph_export::NodeKind;
use crate::key::TypeKey;
use crate::location::Location;
use crate::resolver::{
    GroupResolver, MapResolver, PerScopeResolver, Resolver, ResolverKind, ScopeParamResolver,
    SequenceResolver, SingularResolver,
};

#[cfg(feature = "performance")]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "performance"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

/// Registry holding one resolver per type key.
#[derive(Default)]
pub(crate) struct Registry {
    resolvers: Map<TypeKey, Rc<dyn Resolver>>,
}

impl Registry {
    pub(crate) fn get(&self, key: &TypeKey) -> Option<Rc<dyn Resolver>> {
        self.resolvers.get(key).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Installs a group resolver under `T` and its sequence view under `Vec<T>`.
    pub(crate) fn declare_auto_group<T: Clone + 'static>(&mut self, location: &Location) -> InjectResult<()> {
        let elem = TypeKey::of::<T>();
        let seq = TypeKey::of::<Vec<T>>();
        if self.already_declared(elem, seq, ResolverKind::Group, location)? {
            return Ok(());
        }
        let group = Rc::new(GroupResolver::new::<T>());
        self.resolvers.insert(seq, Rc::new(SequenceResolver::new(group.clone())));
        self.resolvers.insert(elem, group);
        Ok(())
    }

    /// Installs a per-scope resolver under `T` and its map view under `HashMap<Scope, T>`.
    pub(crate) fn declare_per_scope<T: Clone + 'static>(&mut self, location: &Location) -> InjectResult<()> {
        let elem = TypeKey::of::<T>();
        let map = TypeKey::of::<std::collections::HashMap<crate::Scope, T>>();
        if self.already_declared(elem, map, ResolverKind::PerScope, location)? {
            return Ok(());
        }
        let per_scope = Rc::new(PerScopeResolver::new::<T>());
        self.resolvers.insert(map, Rc::new(MapResolver::new(per_scope.clone())));
        self.resolvers.insert(elem, per_scope);
        Ok(())
    }

    // repeating a declaration is a no-op, anything else already there is an error
    fn already_declared(
        &self,
        elem: TypeKey,
        view: TypeKey,
        kind: ResolverKind,
        location: &Location,
    ) -> InjectResult<bool> {
        match (self.get(&elem), self.get(&view)) {
            (None, None) => Ok(false),
            (Some(existing), _) if existing.kind() == kind => Ok(true),
            (Some(existing), _) | (None, Some(existing)) => Err(InjectError::invalid_provider(
                location,
                format!(
                    "cannot declare {} as {} type, {} already has a {} resolver",
                    elem,
                    kind,
                    existing.type_key(),
                    existing.kind()
                ),
            )),
        }
    }

    /// Attaches every output of `node` to the resolver of its type.
    pub(crate) fn add_provider(&mut self, node: Rc<ProviderNode>, debug: &DebugSink) -> InjectResult<()> {
        if node.is_scope_parameterized() && node.scope().is_some() {
            return Err(InjectError::invalid_scope(
                node.location(),
                "a scope-parameterized provider cannot be bound to a scope",
            ));
        }
        debug.graph().add_node(node.location(), node.scope(), NodeKind::Provider);

        for (index, slot) in node.descriptor().outputs().iter().enumerate() {
            let key = slot.key();
            let existing = match self.get(&key) {
                // `Vec<T>` outputs of a group element feed the group itself
                Some(view) if view.kind() == ResolverKind::Sequence => {
                    view.element_key().and_then(|elem| self.get(&elem))
                }
                other => other,
            };

            match existing {
                Some(resolver) => {
                    debug.log(format!("Found {} resolver for {}", resolver.kind(), key));
                    resolver.add_producer(&node, index)?;
                }
                None => {
                    let resolver: Rc<dyn Resolver> = if node.is_scope_parameterized() {
                        Rc::new(ScopeParamResolver::new(key, node.clone(), index))
                    } else {
                        Rc::new(SingularResolver::new(key, node.clone(), index))
                    };
                    debug.log(format!("Registering resolver for {} type {}", resolver.kind(), key));
                    self.resolvers.insert(key, resolver);
                }
            }
        }
        Ok(())
    }
}
