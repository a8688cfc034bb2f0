//! Container options: what a build is configured with.
//!
//! A [`Config`] is a deferred change to the container. Options are applied
//! in order; the first one that fails aborts the build with its error.
//!
//! ```rust
//! use ferrous_inject::{build, configs, declare_auto_group, provide, provide_with_scope, Scope};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Route(&'static str);
//! ferrous_inject::injectable!(Route);
//!
//! let admin = Scope::new("admin");
//! build(
//!     |routes: Vec<Route>| assert_eq!(routes, vec![Route("/"), Route("/admin")]),
//!     configs([
//!         declare_auto_group::<Route>(),
//!         provide(|| Route("/")),
//!         provide_with_scope(&admin, || Route("/admin")),
//!     ]),
//! ).unwrap();
//! ```

use std::any::type_name;

use crate::container::Container;
use crate::debug::DebugOption;
use crate::descriptors::ProviderDescriptor;
use crate::error::{BoxError, InjectError, InjectResult};
use crate::location::Location;
use crate::reflect::{CallSite, ProviderSet};
use crate::scope::Scope;
use crate::slots::IntoSlots;

/// A container option.
#[must_use]
pub struct Config {
    apply: Box<dyn FnOnce(&mut Container) -> InjectResult<()>>,
}

impl Config {
    fn new(apply: impl FnOnce(&mut Container) -> InjectResult<()> + 'static) -> Self {
        Config { apply: Box::new(apply) }
    }

    /// An option that changes nothing.
    pub fn empty() -> Self {
        Config::new(|_| Ok(()))
    }

    pub(crate) fn apply(self, container: &mut Container) -> InjectResult<()> {
        (self.apply)(container)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::empty()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Config")
    }
}

#[track_caller]
fn caller_location(name: String) -> Location {
    let site: CallSite = std::panic::Location::caller();
    Location::at(name, site)
}

fn register(descriptors: InjectResult<Vec<ProviderDescriptor>>, scope: Option<Scope>) -> Config {
    Config::new(move |container| {
        for descriptor in descriptors? {
            container.add_provider(descriptor, scope.clone())?;
        }
        Ok(())
    })
}

/// Registers one provider or a tuple of providers outside of any scope.
#[track_caller]
pub fn provide<M>(providers: impl ProviderSet<M>) -> Config {
    register(providers.into_descriptors(std::panic::Location::caller()), None)
}

/// Registers one provider or a tuple of providers bound to `scope`.
///
/// Their inputs resolve inside `scope`, and they may produce per-scope types.
#[track_caller]
pub fn provide_with_scope<M>(scope: &Scope, providers: impl ProviderSet<M>) -> Config {
    register(
        providers.into_descriptors(std::panic::Location::caller()),
        Some(scope.clone()),
    )
}

/// Registers a value as a provider with no inputs. Consumers get clones.
#[track_caller]
pub fn supply<T: IntoSlots + Clone>(value: T) -> Config {
    let location = caller_location(format!("supply::<{}>", type_name::<T>()));
    let mut outputs = Vec::new();
    T::output_slots(&mut outputs);
    let descriptor = ProviderDescriptor::new(Vec::new(), outputs, location, move |_| {
        let mut values = Vec::new();
        value.clone().into_slots(&mut values);
        Ok(values)
    });
    register(Ok(vec![descriptor]), None)
}

/// Combines several options, applied in order.
pub fn configs(configs: impl IntoIterator<Item = Config>) -> Config {
    let configs: Vec<Config> = configs.into_iter().collect();
    Config::new(move |container| {
        for config in configs {
            config.apply(container)?;
        }
        Ok(())
    })
}

/// An option that fails the build with `err`.
pub fn error(err: impl Into<BoxError>) -> Config {
    let err: BoxError = err.into();
    Config::new(move |_| Err(InjectError::Config(err.to_string())))
}

/// Declares `T` as an auto-group type: every provider of `T` contributes
/// one element and consumers request `Vec<T>`.
///
/// Must come before any provider of `T` or `Vec<T>`.
#[track_caller]
pub fn declare_auto_group<T: Clone + 'static>() -> Config {
    let location = caller_location(format!("declare_auto_group::<{}>", type_name::<T>()));
    Config::new(move |container| container.declare_auto_group::<T>(&location))
}

/// Declares `T` as a per-scope type: one provider per scope, consumers
/// request `HashMap<Scope, T>`.
///
/// Must come before any provider of `T`.
#[track_caller]
pub fn declare_per_scope<T: Clone + 'static>() -> Config {
    let location = caller_location(format!("declare_per_scope::<{}>", type_name::<T>()));
    Config::new(move |container| container.declare_per_scope::<T>(&location))
}

/// Applies debug options while the container is being configured.
pub fn debug_config(option: DebugOption) -> Config {
    Config::new(move |container| {
        option.apply(container.debug());
        Ok(())
    })
}
