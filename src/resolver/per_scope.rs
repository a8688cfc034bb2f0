use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{Resolver, ResolverKind};
use crate::container::{Container, ProviderNode};
use crate::descriptors::{downcast, into_value, AnyValue};
use crate::error::{InjectError, InjectResult, MisuseKind};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

/// Per-scope type `T`: one producer per scope, consumers ask for `HashMap<Scope, T>`.
pub(crate) struct PerScopeResolver {
    elem: TypeKey,
    map: TypeKey,
    producers: RefCell<IndexMap<Scope, (Rc<ProviderNode>, usize)>>,
    value: RefCell<Option<AnyValue>>,
    collect: fn(Vec<(Scope, AnyValue)>) -> InjectResult<AnyValue>,
}

fn collect_map<T: Clone + 'static>(entries: Vec<(Scope, AnyValue)>) -> InjectResult<AnyValue> {
    let mut map = HashMap::with_capacity(entries.len());
    for (scope, value) in entries {
        map.insert(scope, downcast::<T>(&value)?);
    }
    Ok(into_value(map))
}

impl PerScopeResolver {
    pub(crate) fn new<T: Clone + 'static>() -> Self {
        PerScopeResolver {
            elem: TypeKey::of::<T>(),
            map: TypeKey::of::<HashMap<Scope, T>>(),
            producers: RefCell::new(IndexMap::new()),
            value: RefCell::new(None),
            collect: collect_map::<T>,
        }
    }

    fn resolve_map(&self, container: &Container, caller: &Location) -> InjectResult<AnyValue> {
        let producers: Vec<(Scope, Rc<ProviderNode>, usize)> = self
            .producers
            .borrow()
            .iter()
            .map(|(scope, (node, index))| (scope.clone(), node.clone(), *index))
            .collect();

        let cached = self.value.borrow().clone();
        let value = match cached {
            Some(value) => value,
            None => {
                let mut entries = Vec::with_capacity(producers.len());
                for (scope, node, index) in &producers {
                    entries.push((scope.clone(), container.output(node, *index, None)?));
                }
                let value = (self.collect)(entries)?;
                *self.value.borrow_mut() = Some(value.clone());
                value
            }
        };

        container.debug().log(format!("Providing per-scope type {} to {} from:", self.map, caller));
        let _indent = container.debug().indented();
        for (scope, node, _) in &producers {
            container.debug().log(format!("{}: {}", scope, node.location()));
            container.debug().graph().add_edge(node.location(), caller, self.map);
        }
        Ok(value)
    }
}

impl Resolver for PerScopeResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::PerScope
    }

    fn type_key(&self) -> TypeKey {
        self.elem
    }

    fn add_producer(&self, node: &Rc<ProviderNode>, index: usize) -> InjectResult<()> {
        let Some(scope) = node.scope().cloned() else {
            return Err(InjectError::invalid_scope(
                node.location(),
                format!("per-scope type {} must be provided inside a scope", self.elem),
            ));
        };

        let mut producers = self.producers.borrow_mut();
        if let Some((existing, _)) = producers.get(&scope) {
            return Err(InjectError::DuplicateProviderInScope {
                type_name: self.elem.name(),
                scope: scope.name().to_string(),
                location: node.location().clone(),
                existing: existing.location().to_string(),
            });
        }
        producers.insert(scope, (node.clone(), index));
        Ok(())
    }

    fn resolve(&self, _: &Container, _: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue> {
        Err(InjectError::misuse(
            MisuseKind::PerScopeAsInput,
            format!("{} is a per-scope type, {} must request {} instead", self.elem, caller, self.map),
        ))
    }
}

/// The `HashMap<Scope, T>` face of a [`PerScopeResolver`].
pub(crate) struct MapResolver {
    per_scope: Rc<PerScopeResolver>,
}

impl MapResolver {
    pub(crate) fn new(per_scope: Rc<PerScopeResolver>) -> Self {
        MapResolver { per_scope }
    }
}

impl Resolver for MapResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::ScopeMap
    }

    fn type_key(&self) -> TypeKey {
        self.per_scope.map
    }

    fn element_key(&self) -> Option<TypeKey> {
        Some(self.per_scope.elem)
    }

    fn add_producer(&self, node: &Rc<ProviderNode>, _: usize) -> InjectResult<()> {
        Err(InjectError::misuse(
            MisuseKind::MapAsPerScopeProducer,
            format!(
                "{} provides {} directly, per-scope producers attach to {}",
                node.location(),
                self.per_scope.map,
                self.per_scope.elem
            ),
        ))
    }

    fn resolve(&self, container: &Container, _: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue> {
        self.per_scope.resolve_map(container, caller)
    }
}
