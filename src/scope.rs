//! Scope handles.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Opaque named handle partitioning per-scope resolution.
///
/// Scopes compare by identity: clones of one handle are equal, two handles
/// created separately are not, even with the same name. The container never
/// interprets the name; it is carried for logs and graph clusters.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::Scope;
///
/// let a = Scope::new("bank");
/// let same = a.clone();
/// let other = Scope::new("bank");
///
/// assert_eq!(a, same);
/// assert_ne!(a, other);
/// assert_eq!(other.name(), "bank");
/// ```
#[derive(Clone)]
pub struct Scope {
    name: Rc<str>,
}

impl Scope {
    pub fn new(name: impl AsRef<str>) -> Self {
        Scope { name: Rc::from(name.as_ref()) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn addr(&self) -> *const u8 {
        Rc::as_ptr(&self.name) as *const u8
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.name, &other.name)
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.addr() as usize).hash(state);
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope({:?} @ {:p})", &*self.name, self.addr())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
