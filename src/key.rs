//! Type keys for the resolver table.

use std::any::TypeId;
use std::fmt;

/// Key identifying a producible type.
///
/// Two slots with the same key refer to the same value inside one build.
/// The key carries the type name for diagnostics only; equality, hashing
/// and ordering look at the `TypeId` alone.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::TypeKey;
///
/// let a = TypeKey::of::<String>();
/// let b = TypeKey::of::<String>();
/// assert_eq!(a, b);
/// assert_eq!(a.name(), "alloc::string::String");
/// assert_ne!(a, TypeKey::of::<u32>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name, as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeKey {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl PartialOrd for TypeKey {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeKey {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

// TypeId-only hash, the name is diagnostics
impl std::hash::Hash for TypeKey {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
