//! Provider descriptors: the flat, reflected form of a provider.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{BoxError, InjectError, InjectResult, MisuseKind};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

/// Type-erased value flowing between providers.
pub type AnyValue = Rc<dyn Any>;

/// Invocation thunk: ordered input values in, ordered output values out.
pub type Thunk = Rc<dyn Fn(Vec<AnyValue>) -> Result<Vec<AnyValue>, BoxError>>;

/// Wraps a value for use with explicit descriptors.
pub fn into_value<T: 'static>(value: T) -> AnyValue {
    Rc::new(value)
}

/// Clones a `T` out of a type-erased value.
pub fn downcast<T: Clone + 'static>(value: &AnyValue) -> InjectResult<T> {
    value.downcast_ref::<T>().cloned().ok_or_else(|| {
        InjectError::misuse(
            MisuseKind::TypeMismatch,
            format!("value is not a {}", std::any::type_name::<T>()),
        )
    })
}

pub(crate) fn zero_value<T: Default + 'static>() -> AnyValue {
    Rc::new(T::default())
}

/// One input position of a provider.
#[derive(Clone)]
pub struct InputSlot {
    key: TypeKey,
    optional: bool,
    zero: Option<fn() -> AnyValue>,
}

impl InputSlot {
    /// A required input of type `T`.
    pub fn of<T: 'static>() -> Self {
        InputSlot {
            key: TypeKey::of::<T>(),
            optional: false,
            zero: None,
        }
    }

    /// An optional input of type `T`; `T::default()` stands in when nothing provides it.
    pub fn optional<T: Default + 'static>() -> Self {
        InputSlot {
            key: TypeKey::of::<T>(),
            optional: true,
            zero: Some(zero_value::<T>),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub(crate) fn set_optional(&mut self, zero: fn() -> AnyValue) {
        self.optional = true;
        self.zero = Some(zero);
    }

    pub(crate) fn zero_value(&self) -> Option<AnyValue> {
        self.zero.map(|make| make())
    }
}

impl fmt::Debug for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSlot")
            .field("key", &self.key)
            .field("optional", &self.optional)
            .finish()
    }
}

/// One output position of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSlot {
    key: TypeKey,
}

impl OutputSlot {
    pub fn of<T: 'static>() -> Self {
        OutputSlot { key: TypeKey::of::<T>() }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }
}

/// Reflected provider: ordered input and output slots, a thunk, and where it came from.
///
/// Functions are turned into descriptors automatically. A descriptor can
/// also be built by hand and registered in place of a function.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{
///     build, configs, provide, downcast, into_value,
///     InputSlot, Location, OutputSlot, ProviderDescriptor,
/// };
///
/// let doubler = ProviderDescriptor::new(
///     vec![InputSlot::of::<u32>()],
///     vec![OutputSlot::of::<u64>()],
///     Location::named("doubler"),
///     |values| {
///         let n: u32 = downcast(&values[0])?;
///         Ok(vec![into_value(u64::from(n) * 2)])
///     },
/// );
///
/// build(
///     |n: u64| assert_eq!(n, 42),
///     configs([provide(|| 21u32), provide(doubler)]),
/// ).unwrap();
/// ```
#[derive(Clone)]
pub struct ProviderDescriptor {
    inputs: Vec<InputSlot>,
    outputs: Vec<OutputSlot>,
    thunk: Thunk,
    location: Location,
}

impl ProviderDescriptor {
    pub fn new<F>(inputs: Vec<InputSlot>, outputs: Vec<OutputSlot>, location: Location, thunk: F) -> Self
    where
        F: Fn(Vec<AnyValue>) -> Result<Vec<AnyValue>, BoxError> + 'static,
    {
        ProviderDescriptor {
            inputs,
            outputs,
            thunk: Rc::new(thunk),
            location,
        }
    }

    pub fn inputs(&self) -> &[InputSlot] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputSlot] {
        &self.outputs
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub(crate) fn set_member(&mut self, index: usize) {
        self.location.set_member(index);
    }

    /// True when the first input is a [`Scope`]: the provider runs once per calling scope.
    pub fn is_scope_parameterized(&self) -> bool {
        self.inputs
            .first()
            .is_some_and(|slot| slot.key == TypeKey::of::<Scope>())
    }

    pub(crate) fn call(&self, values: Vec<AnyValue>) -> Result<Vec<AnyValue>, BoxError> {
        (self.thunk)(values)
    }

    /// Checks the shape rules that the type system cannot express.
    pub(crate) fn validate(&self) -> InjectResult<()> {
        let scope_key = TypeKey::of::<Scope>();
        for (i, slot) in self.inputs.iter().enumerate() {
            if slot.key == scope_key && (i != 0 || slot.optional) {
                return Err(InjectError::invalid_provider(
                    &self.location,
                    format!("{} may only be declared as the first, required input", scope_key),
                ));
            }
        }
        if self.outputs.iter().any(|slot| slot.key == scope_key) {
            return Err(InjectError::invalid_provider(
                &self.location,
                format!("{} cannot be provided", scope_key),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("location", &self.location)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_only_first() {
        let ok = ProviderDescriptor::new(
            vec![InputSlot::of::<Scope>(), InputSlot::of::<u8>()],
            vec![OutputSlot::of::<u16>()],
            Location::named("ok"),
            |_| Ok(vec![]),
        );
        assert!(ok.is_scope_parameterized());
        assert!(ok.validate().is_ok());

        let bad = ProviderDescriptor::new(
            vec![InputSlot::of::<u8>(), InputSlot::of::<Scope>()],
            vec![],
            Location::named("bad"),
            |_| Ok(vec![]),
        );
        assert!(!bad.is_scope_parameterized());
        assert!(matches!(bad.validate(), Err(InjectError::InvalidProvider { .. })));
    }

    #[test]
    fn optional_slot_zero() {
        let slot = InputSlot::optional::<i64>();
        assert!(slot.is_optional());
        let zero = slot.zero_value().unwrap();
        assert_eq!(downcast::<i64>(&zero).unwrap(), 0);
        assert!(downcast::<u8>(&zero).is_err());
    }
}
