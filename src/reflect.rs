//! Turning functions into provider descriptors.

use std::any::type_name;
use std::marker::PhantomData;

use crate::descriptors::{AnyValue, ProviderDescriptor};
use crate::error::{BoxError, InjectError, InjectResult};
use crate::location::Location;
use crate::slots::{FromSlots, Outputs, SlotValues};

/// The source position of a registering call.
pub type CallSite = &'static std::panic::Location<'static>;

/// Anything that can be reflected into a [`ProviderDescriptor`].
///
/// Implemented for every `Fn(A1, .., An) -> R` with up to eight parameters,
/// where each `Ai` implements [`FromSlots`] and `R` implements [`Outputs`],
/// and for `ProviderDescriptor` itself. `Marker` only disambiguates the
/// implementations and is always inferred.
pub trait IntoDescriptor<Marker>: 'static {
    fn into_descriptor(self, site: CallSite) -> InjectResult<ProviderDescriptor>;
}

impl IntoDescriptor<ProviderDescriptor> for ProviderDescriptor {
    fn into_descriptor(self, _: CallSite) -> InjectResult<ProviderDescriptor> {
        Ok(self)
    }
}

fn location_of<F>(site: CallSite) -> Location {
    Location::at(crate::location::short_name(type_name::<F>()), site)
}

macro_rules! impl_into_descriptor {
    ($($arg:ident),*) => {
        impl<Func, R, $($arg,)*> IntoDescriptor<fn($($arg,)*) -> R> for Func
        where
            Func: Fn($($arg),*) -> R + 'static,
            R: Outputs,
            $($arg: FromSlots,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_descriptor(self, site: CallSite) -> InjectResult<ProviderDescriptor> {
                let location = location_of::<Func>(site);

                let mut inputs = Vec::new();
                $(
                    <$arg as FromSlots>::input_slots(&mut inputs)
                        .map_err(|reason| InjectError::invalid_provider(&location, reason))?;
                )*
                let mut outputs = Vec::new();
                R::output_slots(&mut outputs)
                    .map_err(|reason| InjectError::invalid_provider(&location, reason))?;

                let thunk = move |values: Vec<AnyValue>| -> Result<Vec<AnyValue>, BoxError> {
                    let mut values = SlotValues::new(values);
                    $( let $arg = <$arg as FromSlots>::from_slots(&mut values)?; )*
                    let mut produced = Vec::new();
                    (self)($($arg),*).into_values(&mut produced)?;
                    Ok(produced)
                };

                let descriptor = ProviderDescriptor::new(inputs, outputs, location, thunk);
                descriptor.validate()?;
                Ok(descriptor)
            }
        }
    };
}

impl_into_descriptor!();
impl_into_descriptor!(A1);
impl_into_descriptor!(A1, A2);
impl_into_descriptor!(A1, A2, A3);
impl_into_descriptor!(A1, A2, A3, A4);
impl_into_descriptor!(A1, A2, A3, A4, A5);
impl_into_descriptor!(A1, A2, A3, A4, A5, A6);
impl_into_descriptor!(A1, A2, A3, A4, A5, A6, A7);
impl_into_descriptor!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Marker for a [`ProviderSet`] made of one provider.
pub struct Single<M>(PhantomData<M>);

/// Marker for a [`ProviderSet`] made of a tuple of providers.
pub struct Many<M>(PhantomData<M>);

/// One provider, or a tuple of up to eight providers, registered together.
///
/// ```rust
/// use ferrous_inject::{build, provide};
///
/// build(
///     |n: u8, s: String| assert_eq!(s, format!("{}!", n)),
///     provide((|| 3u8, |n: u8| format!("{}!", n))),
/// ).unwrap();
/// ```
pub trait ProviderSet<Marker> {
    fn into_descriptors(self, site: CallSite) -> InjectResult<Vec<ProviderDescriptor>>;
}

impl<P, M> ProviderSet<Single<M>> for P
where
    P: IntoDescriptor<M>,
{
    fn into_descriptors(self, site: CallSite) -> InjectResult<Vec<ProviderDescriptor>> {
        Ok(vec![self.into_descriptor(site)?])
    }
}

macro_rules! impl_provider_set {
    ($(($p:ident, $m:ident)),+) => {
        impl<$($p, $m,)+> ProviderSet<Many<($($m,)+)>> for ($($p,)+)
        where
            $($p: IntoDescriptor<$m>,)+
        {
            #[allow(non_snake_case)]
            fn into_descriptors(self, site: CallSite) -> InjectResult<Vec<ProviderDescriptor>> {
                let ($($p,)+) = self;
                let mut descriptors = vec![$($p.into_descriptor(site)?,)+];
                if descriptors.len() > 1 {
                    for (i, descriptor) in descriptors.iter_mut().enumerate() {
                        descriptor.set_member(i);
                    }
                }
                Ok(descriptors)
            }
        }
    };
}

impl_provider_set!((P1, M1));
impl_provider_set!((P1, M1), (P2, M2));
impl_provider_set!((P1, M1), (P2, M2), (P3, M3));
impl_provider_set!((P1, M1), (P2, M2), (P3, M3), (P4, M4));
impl_provider_set!((P1, M1), (P2, M2), (P3, M3), (P4, M4), (P5, M5));
impl_provider_set!((P1, M1), (P2, M2), (P3, M3), (P4, M4), (P5, M5), (P6, M6));
impl_provider_set!((P1, M1), (P2, M2), (P3, M3), (P4, M4), (P5, M5), (P6, M6), (P7, M7));
impl_provider_set!((P1, M1), (P2, M2), (P3, M3), (P4, M4), (P5, M5), (P6, M6), (P7, M7), (P8, M8));
