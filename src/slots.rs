//! Mapping Rust types onto flat provider slots.
//!
//! Providers are plain functions. Their parameter types implement
//! [`FromSlots`] and their return type implements [`Outputs`]; together
//! these describe the flat list of input and output slots the container
//! wires. A plain type occupies one slot, while aggregates (see
//! [`aggregate_input!`](crate::aggregate_input)) and tuples expand into
//! one slot per member.
//!
//! Your own types opt in with [`injectable!`](crate::injectable):
//!
//! ```rust
//! use ferrous_inject::{build, configs, injectable, provide};
//!
//! #[derive(Clone)]
//! struct Database { url: String }
//!
//! #[derive(Clone)]
//! struct Repo { db: Database }
//!
//! injectable!(Database, Repo);
//!
//! build(
//!     |repo: Repo| assert_eq!(repo.db.url, "postgres://"),
//!     configs([
//!         provide(|| Database { url: "postgres://".to_string() }),
//!         provide(|db: Database| Repo { db }),
//!     ]),
//! ).unwrap();
//! ```

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::descriptors::{downcast, AnyValue, InputSlot, OutputSlot};
use crate::error::{BoxError, InjectError, InjectResult, MisuseKind};
use crate::scope::Scope;

/// Cursor over the resolved input values of one invocation.
pub struct SlotValues {
    values: std::vec::IntoIter<AnyValue>,
}

impl SlotValues {
    pub fn new(values: Vec<AnyValue>) -> Self {
        SlotValues { values: values.into_iter() }
    }

    /// Takes the next value as a `T`.
    pub fn next<T: Clone + 'static>(&mut self) -> InjectResult<T> {
        let value = self.values.next().ok_or_else(|| {
            InjectError::misuse(
                MisuseKind::TypeMismatch,
                format!("missing input value for {}", std::any::type_name::<T>()),
            )
        })?;
        downcast(&value)
    }
}

/// A type that can be requested as a provider input.
///
/// `input_slots` appends this type's slots in declaration order and
/// `from_slots` consumes the same number of values to rebuild it.
/// A returned `Err` is the reason the signature cannot be wired.
pub trait FromSlots: Sized + 'static {
    fn input_slots(slots: &mut Vec<InputSlot>) -> Result<(), String>;

    fn from_slots(values: &mut SlotValues) -> InjectResult<Self>;
}

/// A type that can be produced as a provider output.
pub trait IntoSlots: 'static {
    fn output_slots(slots: &mut Vec<OutputSlot>);

    fn into_slots(self, values: &mut Vec<AnyValue>);
}

/// A provider's return type.
///
/// Implemented for `()`, every [`IntoSlots`] type declared through the
/// crate's macros, tuples of up to eight [`IntoSlots`] types and
/// `Result<T, E>` over any of those. The `Result` form lets a provider fail;
/// its error aborts the build.
pub trait Outputs: 'static {
    /// Whether this return type carries an error.
    const FALLIBLE: bool = false;

    fn output_slots(slots: &mut Vec<OutputSlot>) -> Result<(), String>;

    fn into_values(self, values: &mut Vec<AnyValue>) -> Result<(), BoxError>;
}

impl Outputs for () {
    fn output_slots(_: &mut Vec<OutputSlot>) -> Result<(), String> {
        Ok(())
    }

    fn into_values(self, _: &mut Vec<AnyValue>) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T, E> Outputs for Result<T, E>
where
    T: Outputs,
    E: Into<BoxError> + 'static,
{
    const FALLIBLE: bool = true;

    fn output_slots(slots: &mut Vec<OutputSlot>) -> Result<(), String> {
        if T::FALLIBLE {
            return Err("an error result may only be the outermost return type".to_string());
        }
        T::output_slots(slots)
    }

    fn into_values(self, values: &mut Vec<AnyValue>) -> Result<(), BoxError> {
        self.map_err(Into::into)?.into_values(values)
    }
}

/// Implements the slot traits for types that occupy a single slot.
///
/// Each type must be `Clone + 'static`: consumers receive their own clone
/// of the provided value.
///
/// ```rust
/// use ferrous_inject::{inject, injectable, provide};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Port(u16);
/// injectable!(Port);
///
/// let port: Port = inject(provide(|| Port(8080))).unwrap();
/// assert_eq!(port, Port(8080));
/// ```
#[macro_export]
macro_rules! injectable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FromSlots for $ty {
                fn input_slots(
                    slots: &mut ::std::vec::Vec<$crate::InputSlot>,
                ) -> ::std::result::Result<(), ::std::string::String> {
                    slots.push($crate::InputSlot::of::<$ty>());
                    Ok(())
                }

                fn from_slots(values: &mut $crate::SlotValues) -> $crate::InjectResult<Self> {
                    values.next::<$ty>()
                }
            }

            impl $crate::IntoSlots for $ty {
                fn output_slots(slots: &mut ::std::vec::Vec<$crate::OutputSlot>) {
                    slots.push($crate::OutputSlot::of::<$ty>());
                }

                fn into_slots(self, values: &mut ::std::vec::Vec<$crate::AnyValue>) {
                    values.push($crate::into_value(self));
                }
            }

            $crate::__outputs_via_slots!($ty);
        )+
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __outputs_via_slots {
    ($ty:ty $(; $($gen:tt)*)?) => {
        impl $(<$($gen)*>)? $crate::Outputs for $ty {
            fn output_slots(
                slots: &mut ::std::vec::Vec<$crate::OutputSlot>,
            ) -> ::std::result::Result<(), ::std::string::String> {
                <Self as $crate::IntoSlots>::output_slots(slots);
                Ok(())
            }

            fn into_values(
                self,
                values: &mut ::std::vec::Vec<$crate::AnyValue>,
            ) -> ::std::result::Result<(), $crate::BoxError> {
                <Self as $crate::IntoSlots>::into_slots(self, values);
                Ok(())
            }
        }
    };
}

injectable!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str, std::path::PathBuf, std::time::Duration,
);

// single-slot impls for generic containers
macro_rules! generic_single_slot {
    ($ty:ty; $($gen:tt)*) => {
        impl<$($gen)*> FromSlots for $ty {
            fn input_slots(slots: &mut Vec<InputSlot>) -> Result<(), String> {
                slots.push(InputSlot::of::<$ty>());
                Ok(())
            }

            fn from_slots(values: &mut SlotValues) -> InjectResult<Self> {
                values.next::<$ty>()
            }
        }

        impl<$($gen)*> IntoSlots for $ty {
            fn output_slots(slots: &mut Vec<OutputSlot>) {
                slots.push(OutputSlot::of::<$ty>());
            }

            fn into_slots(self, values: &mut Vec<AnyValue>) {
                values.push(Rc::new(self));
            }
        }

        crate::__outputs_via_slots!($ty; $($gen)*);
    };
}

generic_single_slot!(Vec<T>; T: Clone + 'static);
generic_single_slot!(HashMap<Scope, T>; T: Clone + 'static);
generic_single_slot!(Option<T>; T: Clone + 'static);
generic_single_slot!(Arc<T>; T: ?Sized + 'static);
generic_single_slot!(Rc<T>; T: ?Sized + 'static);

impl FromSlots for Scope {
    fn input_slots(slots: &mut Vec<InputSlot>) -> Result<(), String> {
        slots.push(InputSlot::of::<Scope>());
        Ok(())
    }

    fn from_slots(values: &mut SlotValues) -> InjectResult<Self> {
        values.next::<Scope>()
    }
}

macro_rules! tuple_slots {
    ($($name:ident),+) => {
        impl<$($name: FromSlots),+> FromSlots for ($($name,)+) {
            fn input_slots(slots: &mut Vec<InputSlot>) -> Result<(), String> {
                $( $name::input_slots(slots)?; )+
                Ok(())
            }

            fn from_slots(values: &mut SlotValues) -> InjectResult<Self> {
                Ok(($( $name::from_slots(values)?, )+))
            }
        }

        impl<$($name: IntoSlots),+> Outputs for ($($name,)+) {
            fn output_slots(slots: &mut Vec<OutputSlot>) -> Result<(), String> {
                $( $name::output_slots(slots); )+
                Ok(())
            }

            #[allow(non_snake_case)]
            fn into_values(self, values: &mut Vec<AnyValue>) -> Result<(), BoxError> {
                let ($($name,)+) = self;
                $( $name.into_slots(values); )+
                Ok(())
            }
        }
    };
}

tuple_slots!(A);
tuple_slots!(A, B);
tuple_slots!(A, B, C);
tuple_slots!(A, B, C, D);
tuple_slots!(A, B, C, D, E);
tuple_slots!(A, B, C, D, E, F);
tuple_slots!(A, B, C, D, E, F, G);
tuple_slots!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TypeKey;

    fn inputs<T: FromSlots>() -> Vec<TypeKey> {
        let mut slots = Vec::new();
        T::input_slots(&mut slots).unwrap();
        slots.iter().map(InputSlot::key).collect()
    }

    fn outputs<T: Outputs>() -> Result<Vec<TypeKey>, String> {
        let mut slots = Vec::new();
        T::output_slots(&mut slots)?;
        Ok(slots.iter().map(OutputSlot::key).collect())
    }

    #[test]
    fn tuples_flatten_in_order() {
        assert_eq!(
            inputs::<(u8, String, Vec<i32>)>(),
            vec![TypeKey::of::<u8>(), TypeKey::of::<String>(), TypeKey::of::<Vec<i32>>()]
        );
        assert_eq!(outputs::<(u16, bool)>().unwrap().len(), 2);
        assert!(outputs::<()>().unwrap().is_empty());
    }

    #[test]
    fn error_result_outermost_only() {
        assert_eq!(outputs::<Result<u8, String>>().unwrap(), vec![TypeKey::of::<u8>()]);
        assert!(outputs::<Result<Result<u8, String>, String>>().is_err());
    }

    #[test]
    fn failed_result_propagates() {
        let mut values = Vec::new();
        let err = Err::<u8, _>("boom").into_values(&mut values).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(values.is_empty());
    }

    #[test]
    fn values_rebuild_tuples() {
        let mut values = SlotValues::new(vec![Rc::new(7u8), Rc::new("x".to_string())]);
        let (n, s) = <(u8, String)>::from_slots(&mut values).unwrap();
        assert_eq!((n, s.as_str()), (7, "x"));
        assert!(u8::from_slots(&mut values).is_err());
    }
}
