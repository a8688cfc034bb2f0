use std::cell::RefCell;
use std::rc::Rc;

use super::{output_key, Resolver, ResolverKind};
use crate::container::{Container, ProviderNode};
use crate::descriptors::{downcast, into_value, AnyValue};
use crate::error::{InjectError, InjectResult, MisuseKind};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

#[derive(Clone)]
struct GroupProducer {
    node: Rc<ProviderNode>,
    index: usize,
    // the producer returns `Vec<T>`, not `T`
    flatten: bool,
}

/// Auto-group type `T`: every producer contributes, consumers ask for `Vec<T>`.
pub(crate) struct GroupResolver {
    elem: TypeKey,
    seq: TypeKey,
    producers: RefCell<Vec<GroupProducer>>,
    value: RefCell<Option<AnyValue>>,
    collect: fn(Vec<AnyValue>) -> InjectResult<AnyValue>,
    split: fn(&AnyValue) -> InjectResult<Vec<AnyValue>>,
}

fn collect_vec<T: Clone + 'static>(items: Vec<AnyValue>) -> InjectResult<AnyValue> {
    let items = items.iter().map(downcast::<T>).collect::<InjectResult<Vec<T>>>()?;
    Ok(into_value(items))
}

fn split_vec<T: Clone + 'static>(value: &AnyValue) -> InjectResult<Vec<AnyValue>> {
    let items: Vec<T> = downcast(value)?;
    Ok(items.into_iter().map(into_value).collect())
}

impl GroupResolver {
    pub(crate) fn new<T: Clone + 'static>() -> Self {
        GroupResolver {
            elem: TypeKey::of::<T>(),
            seq: TypeKey::of::<Vec<T>>(),
            producers: RefCell::new(Vec::new()),
            value: RefCell::new(None),
            collect: collect_vec::<T>,
            split: split_vec::<T>,
        }
    }

    fn resolve_sequence(&self, container: &Container, caller: &Location) -> InjectResult<AnyValue> {
        let producers = self.producers.borrow().clone();

        let cached = self.value.borrow().clone();
        let value = match cached {
            Some(value) => value,
            None => {
                let mut items = Vec::new();
                for producer in &producers {
                    let value = container.output(&producer.node, producer.index, None)?;
                    if producer.flatten {
                        items.extend((self.split)(&value)?);
                    } else {
                        items.push(value);
                    }
                }
                let value = (self.collect)(items)?;
                *self.value.borrow_mut() = Some(value.clone());
                value
            }
        };

        container.debug().log(format!("Providing auto-group type {} to {} from:", self.seq, caller));
        let _indent = container.debug().indented();
        for producer in &producers {
            let location = producer.node.location();
            container.debug().log(location.to_string());
            container.debug().graph().add_edge(location, caller, self.seq);
        }
        Ok(value)
    }
}

impl Resolver for GroupResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Group
    }

    fn type_key(&self) -> TypeKey {
        self.elem
    }

    fn add_producer(&self, node: &Rc<ProviderNode>, index: usize) -> InjectResult<()> {
        if node.is_scope_parameterized() {
            return Err(InjectError::invalid_scope(
                node.location(),
                format!("auto-group type {} cannot be provided by a scope-parameterized provider", self.elem),
            ));
        }
        let flatten = output_key(node, index) == Some(self.seq);
        self.producers.borrow_mut().push(GroupProducer {
            node: node.clone(),
            index,
            flatten,
        });
        Ok(())
    }

    fn resolve(&self, _: &Container, _: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue> {
        Err(InjectError::misuse(
            MisuseKind::GroupAsInput,
            format!("{} is an auto-group type, {} must request {} instead", self.elem, caller, self.seq),
        ))
    }
}

/// The `Vec<T>` face of a [`GroupResolver`].
pub(crate) struct SequenceResolver {
    group: Rc<GroupResolver>,
}

impl SequenceResolver {
    pub(crate) fn new(group: Rc<GroupResolver>) -> Self {
        SequenceResolver { group }
    }
}

impl Resolver for SequenceResolver {
    fn kind(&self) -> ResolverKind {
        ResolverKind::Sequence
    }

    fn type_key(&self) -> TypeKey {
        self.group.seq
    }

    fn element_key(&self) -> Option<TypeKey> {
        Some(self.group.elem)
    }

    fn add_producer(&self, node: &Rc<ProviderNode>, _: usize) -> InjectResult<()> {
        Err(InjectError::misuse(
            MisuseKind::SequenceAsGroupProducer,
            format!(
                "{} provides {} directly, auto-group producers attach to {}",
                node.location(),
                self.group.seq,
                self.group.elem
            ),
        ))
    }

    fn resolve(&self, container: &Container, _: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue> {
        self.group.resolve_sequence(container, caller)
    }
}
