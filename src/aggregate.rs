//! Aggregate structs: many slots behind one parameter or return value.
//!
//! A provider with a dozen dependencies reads better as one struct argument
//! than as a dozen parameters. An aggregate input is flattened into one slot
//! per field; the container builds a fresh struct per invocation from the
//! resolved field values. An aggregate output is split into one output slot
//! per field.
//!
//! ```rust
//! use ferrous_inject::{aggregate_input, aggregate_output, build, configs, provide};
//!
//! aggregate_output! {
//!     pub struct Settings {
//!         pub port: u16,
//!         pub host: String,
//!     }
//! }
//!
//! aggregate_input! {
//!     pub struct ServerDeps {
//!         pub port: u16,
//!         pub host: String,
//!         #[optional]
//!         pub workers: usize,
//!     }
//! }
//!
//! build(
//!     |deps: ServerDeps| {
//!         assert_eq!(deps.port, 8080);
//!         assert_eq!(deps.host, "localhost");
//!         assert_eq!(deps.workers, 0);
//!     },
//!     configs([provide(|| Settings { port: 8080, host: "localhost".into() })]),
//! ).unwrap();
//! ```

use crate::descriptors::{zero_value, InputSlot};
use crate::slots::{FromSlots, IntoSlots};

/// Marker for structs declared with [`aggregate_input!`](crate::aggregate_input).
pub trait AggregateInput: FromSlots {}

/// Marker for structs declared with [`aggregate_output!`](crate::aggregate_output).
pub trait AggregateOutput: IntoSlots {}

#[doc(hidden)]
pub fn mark_optional<T: Default + 'static>(
    slots: &mut [InputSlot],
    start: usize,
    field: &str,
) -> Result<(), String> {
    match slots.get_mut(start..) {
        Some([slot]) => {
            slot.set_optional(zero_value::<T>);
            Ok(())
        }
        _ => Err(format!(
            "optional field `{}` must occupy exactly one input slot",
            field
        )),
    }
}

/// Declares a struct whose fields are injected individually.
///
/// Fields may be marked `#[optional]`; an optional field receives
/// `Default::default()` when nothing provides its type. Only single-slot
/// fields can be optional. Field-level attributes other than `#[optional]`
/// are rejected when the provider is registered.
#[macro_export]
macro_rules! aggregate_input {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fattr:ident])? $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $field: $fty, )*
        }

        impl $crate::AggregateInput for $name {}

        impl $crate::FromSlots for $name {
            fn input_slots(
                slots: &mut ::std::vec::Vec<$crate::InputSlot>,
            ) -> ::std::result::Result<(), ::std::string::String> {
                $( $crate::__aggregate_field_check!($field $(, $fattr)?)?; )*
                $( $crate::__aggregate_field_slots!(slots, $field, $fty $(, $fattr)?); )*
                Ok(())
            }

            fn from_slots(values: &mut $crate::SlotValues) -> $crate::InjectResult<Self> {
                Ok($name {
                    $( $field: <$fty as $crate::FromSlots>::from_slots(values)?, )*
                })
            }
        }
    };
}

// annotations are checked before any slot is pushed
#[doc(hidden)]
#[macro_export]
macro_rules! __aggregate_field_check {
    ($field:ident) => {
        ::std::result::Result::<(), ::std::string::String>::Ok(())
    };
    ($field:ident, optional) => {
        ::std::result::Result::<(), ::std::string::String>::Ok(())
    };
    ($field:ident, $other:ident) => {
        ::std::result::Result::<(), ::std::string::String>::Err(::std::format!(
            "unknown annotation `{}` on field `{}`",
            stringify!($other),
            stringify!($field)
        ))
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __aggregate_field_slots {
    ($slots:ident, $field:ident, $fty:ty) => {
        <$fty as $crate::FromSlots>::input_slots($slots)?;
    };
    ($slots:ident, $field:ident, $fty:ty, optional) => {{
        let start = $slots.len();
        <$fty as $crate::FromSlots>::input_slots($slots)?;
        $crate::aggregate::mark_optional::<$fty>($slots, start, stringify!($field))?;
    }};
    ($slots:ident, $field:ident, $fty:ty, $other:ident) => {
        <$fty as $crate::FromSlots>::input_slots($slots)?;
    };
}

/// Declares a struct whose fields are provided individually.
#[macro_export]
macro_rules! aggregate_output {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $field: $fty, )*
        }

        impl $crate::AggregateOutput for $name {}

        impl $crate::IntoSlots for $name {
            fn output_slots(slots: &mut ::std::vec::Vec<$crate::OutputSlot>) {
                $( <$fty as $crate::IntoSlots>::output_slots(slots); )*
            }

            fn into_slots(self, values: &mut ::std::vec::Vec<$crate::AnyValue>) {
                $( <$fty as $crate::IntoSlots>::into_slots(self.$field, values); )*
            }
        }

        $crate::__outputs_via_slots!($name);
    };
}

#[cfg(test)]
mod tests {
    use crate::key::TypeKey;
    use crate::{AnyValue, FromSlots, InputSlot, IntoSlots, OutputSlot, SlotValues};
    use std::rc::Rc;

    crate::aggregate_input! {
        struct Deps {
            name: String,
            #[optional]
            retries: u32,
            pair: (u8, i8),
        }
    }

    crate::aggregate_input! {
        struct BadOptional {
            #[optional]
            pair: (u8, u16),
        }
    }

    crate::aggregate_input! {
        struct UnknownAnnotation {
            count: u8,
            #[required]
            name: String,
        }
    }

    crate::aggregate_output! {
        struct Out {
            a: u16,
            b: String,
        }
    }

    #[test]
    fn input_fields_flatten() {
        let mut slots = Vec::new();
        Deps::input_slots(&mut slots).unwrap();
        let keys: Vec<_> = slots.iter().map(InputSlot::key).collect();
        assert_eq!(
            keys,
            vec![TypeKey::of::<String>(), TypeKey::of::<u32>(), TypeKey::of::<u8>(), TypeKey::of::<i8>()]
        );
        assert!(!slots[0].is_optional());
        assert!(slots[1].is_optional());

        let values: Vec<AnyValue> = vec![Rc::new("n".to_string()), Rc::new(3u32), Rc::new(1u8), Rc::new(-1i8)];
        let deps = Deps::from_slots(&mut SlotValues::new(values)).unwrap();
        assert_eq!((deps.name.as_str(), deps.retries, deps.pair), ("n", 3, (1, -1)));
    }

    #[test]
    fn malformed_annotations_rejected() {
        let mut slots = Vec::new();
        assert!(BadOptional::input_slots(&mut slots).is_err());
        slots.clear();
        let reason = UnknownAnnotation::input_slots(&mut slots).unwrap_err();
        assert_eq!(reason, "unknown annotation `required` on field `name`");
        assert!(slots.is_empty());
    }

    #[test]
    fn output_fields_flatten() {
        let mut slots = Vec::new();
        Out::output_slots(&mut slots);
        assert_eq!(slots, vec![OutputSlot::of::<u16>(), OutputSlot::of::<String>()]);

        let mut values = Vec::new();
        Out { a: 1, b: "b".into() }.into_slots(&mut values);
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].downcast_ref::<String>().map(String::as_str), Some("b"));
    }
}
