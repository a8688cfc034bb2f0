//! Source locations of providers, used in diagnostics and graph nodes.

use std::fmt;
use std::sync::Arc;

/// Where a provider came from.
///
/// `name` is the provider's symbol (the function item's type name, or a
/// closure path); `file`/`line`/`column` point at the call that registered
/// it. Any part may be empty when it isn't known. Providers registered
/// together as a tuple also carry their position in the tuple.
///
/// Every registration inside a build gets its own node number, so two
/// providers with the same name and call site are still distinct
/// locations. The number is not displayed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Location {
    name: Arc<str>,
    file: &'static str,
    line: u32,
    column: u32,
    member: Option<usize>,
    node: Option<usize>,
}

impl Location {
    pub fn new(name: impl AsRef<str>, file: &'static str, line: u32) -> Self {
        Location {
            name: Arc::from(name.as_ref()),
            file,
            line,
            column: 0,
            member: None,
            node: None,
        }
    }

    /// Location named after `F`, positioned at the caller of the enclosing
    /// `#[track_caller]` chain.
    #[track_caller]
    pub fn of<F: ?Sized>() -> Self {
        Location::at(short_name(std::any::type_name::<F>()), std::panic::Location::caller())
    }

    /// A location with only a symbol name.
    pub fn named(name: impl AsRef<str>) -> Self {
        Location::new(name, "", 0)
    }

    pub(crate) fn at(name: impl AsRef<str>, site: &'static std::panic::Location<'static>) -> Self {
        Location {
            column: site.column(),
            ..Location::new(name, site.file(), site.line())
        }
    }

    /// Position within a tuple of providers registered by one call.
    pub(crate) fn set_member(&mut self, index: usize) {
        self.member = Some(index);
    }

    /// This location, tagged with the registration number `node`.
    pub(crate) fn for_node(&self, node: usize) -> Location {
        Location {
            node: Some(node),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Column of the registering call, 0 when unknown.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Index within a provider tuple, if registered as part of one.
    pub fn member(&self) -> Option<usize> {
        self.member
    }
}

// `a::b::c::{{closure}}` stays intact, generic arguments are dropped
pub(crate) fn short_name(full: &str) -> &str {
    match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(member) = self.member {
            write!(f, " #{}", member)?;
        }
        if self.file.is_empty() {
            return Ok(());
        }
        match self.column {
            0 => write!(f, " ({}:{})", self.file, self.line),
            column => write!(f, " ({}:{}:{})", self.file, self.line, column),
        }
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
