//! The engine: provider invocation, slot resolution and the build entry points.

use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::debug::{DebugOption, DebugSink};
use crate::descriptors::{AnyValue, InputSlot, ProviderDescriptor};
use crate::error::{InjectError, InjectResult};
use crate::graph_export::{NodeKind, NodeStatus};
use crate::internal::ResolveStack;
use crate::key::TypeKey;
use crate::location::Location;
use crate::options::Config;
use crate::reflect::{CallSite, IntoDescriptor};
use crate::registration::Registry;
use crate::scope::Scope;
use crate::slots::{FromSlots, SlotValues};

type Outputs = Rc<[AnyValue]>;

/// A registered provider together with its memoized outputs.
pub(crate) struct ProviderNode {
    descriptor: ProviderDescriptor,
    // the descriptor's location, numbered by registration order
    location: Location,
    scope: Option<Scope>,
    values: RefCell<Option<Outputs>>,
    // scope-parameterized providers run once per calling scope
    scoped_values: RefCell<HashMap<Scope, Outputs>>,
}

impl ProviderNode {
    pub(crate) fn new(descriptor: ProviderDescriptor, scope: Option<Scope>, number: usize) -> Self {
        ProviderNode {
            location: descriptor.location().for_node(number),
            descriptor,
            scope,
            values: RefCell::new(None),
            scoped_values: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    pub(crate) fn location(&self) -> &Location {
        &self.location
    }

    /// The scope this provider was registered in.
    pub(crate) fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub(crate) fn is_scope_parameterized(&self) -> bool {
        self.descriptor.is_scope_parameterized()
    }

    fn cached(&self, scope: Option<&Scope>) -> Option<Outputs> {
        match scope {
            Some(scope) if self.is_scope_parameterized() => self.scoped_values.borrow().get(scope).cloned(),
            _ => self.values.borrow().clone(),
        }
    }

    fn store(&self, scope: Option<&Scope>, outputs: Outputs) {
        match scope {
            Some(scope) if self.is_scope_parameterized() => {
                self.scoped_values.borrow_mut().insert(scope.clone(), outputs);
            }
            _ => *self.values.borrow_mut() = Some(outputs),
        }
    }
}

/// State of one build.
pub(crate) struct Container {
    registry: Registry,
    debug: DebugSink,
    stack: ResolveStack,
    nodes: Cell<usize>,
}

impl Container {
    pub(crate) fn new() -> Self {
        Container {
            registry: Registry::default(),
            debug: DebugSink::new(),
            stack: ResolveStack::default(),
            nodes: Cell::new(0),
        }
    }

    fn next_node(&self) -> usize {
        let number = self.nodes.get();
        self.nodes.set(number + 1);
        number
    }

    pub(crate) fn debug(&self) -> &DebugSink {
        &self.debug
    }

    pub(crate) fn add_provider(&mut self, descriptor: ProviderDescriptor, scope: Option<Scope>) -> InjectResult<()> {
        descriptor.validate()?;
        match &scope {
            Some(scope) => self.debug.log(format!("Registering {} in scope {}", descriptor.location(), scope)),
            None => self.debug.log(format!("Registering {}", descriptor.location())),
        }
        self.debug.indent();
        let node = ProviderNode::new(descriptor, scope, self.next_node());
        let result = self.registry.add_provider(Rc::new(node), &self.debug);
        self.debug.dedent();
        result
    }

    pub(crate) fn declare_auto_group<T: Clone + 'static>(&mut self, location: &Location) -> InjectResult<()> {
        self.debug.log(format!("Declaring auto-group type {}", type_name::<T>()));
        self.registry.declare_auto_group::<T>(location)
    }

    pub(crate) fn declare_per_scope<T: Clone + 'static>(&mut self, location: &Location) -> InjectResult<()> {
        self.debug.log(format!("Declaring per-scope type {}", type_name::<T>()));
        self.registry.declare_per_scope::<T>(location)
    }

    /// Resolves one input slot for `caller`, inside `scope`.
    pub(crate) fn resolve(&self, slot: &InputSlot, scope: Option<&Scope>, caller: &Location) -> InjectResult<AnyValue> {
        let key = slot.key();
        let _frame = self.stack.enter(key, scope, caller)?;

        match self.registry.get(&key) {
            Some(resolver) => resolver.resolve(self, scope, caller),
            None => match slot.zero_value() {
                Some(zero) if slot.is_optional() => {
                    self.debug.log(format!("Providing zero value for optional dependency {} to {}", key, caller));
                    Ok(zero)
                }
                _ => Err(InjectError::NoProvider {
                    type_name: key.name(),
                    caller: caller.to_string(),
                    stack: self.stack.describe(),
                }),
            },
        }
    }

    /// Output `index` of `node`, invoking it first if needed.
    pub(crate) fn output(&self, node: &ProviderNode, index: usize, scope: Option<&Scope>) -> InjectResult<AnyValue> {
        let outputs = self.call(node, scope)?;
        outputs.get(index).cloned().ok_or_else(|| {
            InjectError::invalid_provider(node.location(), format!("no output at position {}", index))
        })
    }

    /// Logs and records a value handed from `producer` to `caller`.
    pub(crate) fn provided(&self, key: TypeKey, producer: &Location, caller: &Location) {
        self.debug.log(format!("Providing {} from {} to {}", key, producer, caller));
        self.debug.graph().add_edge(producer, caller, key);
    }

    fn call(&self, node: &ProviderNode, caller_scope: Option<&Scope>) -> InjectResult<Outputs> {
        let location = node.location();
        let scope = if node.is_scope_parameterized() {
            match caller_scope {
                Some(scope) => Some(scope),
                None => {
                    return Err(InjectError::ScopeRequired {
                        type_name: type_name::<Scope>(),
                        caller: location.to_string(),
                    })
                }
            }
        } else {
            node.scope()
        };

        if let Some(outputs) = node.cached(scope) {
            return Ok(outputs);
        }

        let values = self
            .resolve_inputs(node.descriptor(), location, scope)
            .map_err(|err| self.failed(location, err))?;

        self.debug.log(format!("Calling {}", location));
        let outputs = node.descriptor().call(values).map_err(|source| {
            self.failed(
                location,
                InjectError::Provider {
                    location: location.clone(),
                    source,
                },
            )
        })?;
        if outputs.len() != node.descriptor().outputs().len() {
            return Err(self.failed(
                location,
                InjectError::invalid_provider(
                    location,
                    format!(
                        "returned {} values but declares {} outputs",
                        outputs.len(),
                        node.descriptor().outputs().len()
                    ),
                ),
            ));
        }

        self.debug.graph().mark(location, NodeStatus::Used);
        let outputs: Outputs = outputs.into();
        node.store(scope, outputs.clone());
        Ok(outputs)
    }

    // a scope-parameterized descriptor gets the scope itself as its first value
    fn resolve_inputs(
        &self,
        descriptor: &ProviderDescriptor,
        location: &Location,
        scope: Option<&Scope>,
    ) -> InjectResult<Vec<AnyValue>> {
        self.debug.log(format!("Resolving dependencies for {}", location));
        let _indent = self.debug.indented();

        let mut values = Vec::with_capacity(descriptor.inputs().len());
        let mut inputs = descriptor.inputs().iter();
        if descriptor.is_scope_parameterized() {
            inputs.next();
            if let Some(scope) = scope {
                values.push(Rc::new(scope.clone()) as AnyValue);
            }
        }
        for slot in inputs {
            values.push(self.resolve(slot, scope, location)?);
        }
        Ok(values)
    }

    fn failed(&self, location: &Location, err: InjectError) -> InjectError {
        self.debug.graph().mark(location, NodeStatus::Failed);
        err
    }

    /// Resolves the invoker's inputs and calls it.
    pub(crate) fn run(&self, invoker: ProviderDescriptor) -> InjectResult<()> {
        let location = invoker.location().clone();
        if invoker.is_scope_parameterized() {
            return Err(InjectError::invalid_provider(&location, "an invoker cannot take a Scope"));
        }
        if !invoker.outputs().is_empty() {
            let outputs: Vec<&str> = invoker.outputs().iter().map(|slot| slot.key().name()).collect();
            return Err(InjectError::InvalidInvoker {
                location,
                outputs: outputs.join(", "),
            });
        }

        let location = location.for_node(self.next_node());
        self.debug.graph().add_node(&location, None, NodeKind::Invoker);
        self.debug.log(format!("Building container with {} resolvers", self.registry.len()));
        let values = self
            .resolve_inputs(&invoker, &location, None)
            .map_err(|err| self.failed(&location, err))?;

        self.debug.log(format!("Calling invoker {}", location));
        invoker.call(values).map_err(|source| {
            self.failed(
                &location,
                InjectError::Provider {
                    location: location.clone(),
                    source,
                },
            )
        })?;
        self.debug.graph().mark(&location, NodeStatus::Used);
        self.debug.log("Done building container");
        Ok(())
    }

    fn configure_and_run(
        &mut self,
        debug: DebugOption,
        config: Config,
        invoker: InjectResult<ProviderDescriptor>,
    ) -> InjectResult<()> {
        self.debug.log("Initializing logger");
        debug.apply(&self.debug);

        self.debug.log("Registering providers");
        self.debug.indent();
        let configured = config.apply(self);
        self.debug.dedent();
        configured?;

        self.run(invoker?)
    }
}

/// Runs one build to completion and flushes the debug sink.
pub(crate) fn build_with(
    debug: DebugOption,
    config: Config,
    invoker: InjectResult<ProviderDescriptor>,
) -> InjectResult<()> {
    tracing::debug!(target: "ferrous_inject", "building container");
    let mut container = Container::new();
    let result = container.configure_and_run(debug, config, invoker);
    container.debug.finish(&result);
    match &result {
        Ok(()) => tracing::debug!(target: "ferrous_inject", "container built"),
        Err(err) => tracing::debug!(target: "ferrous_inject", %err, "container build failed"),
    }
    result
}

/// Builds a container from `config` and calls `invoker` with its parameters resolved.
///
/// `invoker` is any function whose parameters implement
/// [`FromSlots`] and which returns `()` or `Result<(), E>`.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{build, configs, provide, supply};
///
/// build(
///     |greeting: String| assert_eq!(greeting, "hello, world"),
///     configs([
///         supply("world"),
///         provide(|name: &'static str| format!("hello, {}", name)),
///     ]),
/// ).unwrap();
/// ```
#[track_caller]
pub fn build<M>(invoker: impl IntoDescriptor<M>, config: Config) -> InjectResult<()> {
    build_debug(DebugOption::none(), invoker, config)
}

/// Like [`build`], with debug options applied before the config.
#[track_caller]
pub fn build_debug<M>(debug: DebugOption, invoker: impl IntoDescriptor<M>, config: Config) -> InjectResult<()> {
    let site: CallSite = std::panic::Location::caller();
    build_with(debug, config, invoker.into_descriptor(site))
}

/// Builds a container from `config` and returns a resolved `T`.
///
/// `T` may be a single type, a tuple or an
/// [`aggregate_input!`](crate::aggregate_input) struct.
///
/// ```rust
/// use ferrous_inject::{configs, inject, provide};
///
/// let (n, s): (u32, String) = inject(configs([
///     provide(|| 7u32),
///     provide(|n: u32| n.to_string()),
/// ])).unwrap();
/// assert_eq!((n, s.as_str()), (7, "7"));
/// ```
#[track_caller]
pub fn inject<T: FromSlots>(config: Config) -> InjectResult<T> {
    inject_debug(DebugOption::none(), config)
}

/// Like [`inject`], with debug options applied before the config.
#[track_caller]
pub fn inject_debug<T: FromSlots>(debug: DebugOption, config: Config) -> InjectResult<T> {
    let site: CallSite = std::panic::Location::caller();
    let location = Location::at(format!("inject::<{}>", type_name::<T>()), site);

    let target: Rc<RefCell<Option<T>>> = Rc::default();
    let slot = target.clone();
    let mut inputs = Vec::new();
    let invoker = T::input_slots(&mut inputs)
        .map_err(|reason| InjectError::invalid_provider(&location, reason))
        .map(|()| {
            ProviderDescriptor::new(inputs, Vec::new(), location.clone(), move |values| {
                *slot.borrow_mut() = Some(T::from_slots(&mut SlotValues::new(values))?);
                Ok(Vec::new())
            })
        });

    build_with(debug, config, invoker)?;
    let value = target.borrow_mut().take();
    value.ok_or_else(|| InjectError::invalid_provider(&location, "the injection target was never assigned"))
}
