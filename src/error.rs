//! Error types for the dependency injection container.

use std::fmt;

use crate::location::Location;

/// Boxed error returned by fallible providers and invokers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The ways a caller can misuse auto-group and per-scope types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisuseKind {
    /// An auto-group element type was requested directly instead of `Vec<T>`.
    GroupAsInput,
    /// A per-scope element type was requested directly instead of `HashMap<Scope, T>`.
    PerScopeAsInput,
    /// A producer was registered directly against the `Vec<T>` view of a group.
    SequenceAsGroupProducer,
    /// A provider returned `HashMap<Scope, T>` for a per-scope type `T`.
    MapAsPerScopeProducer,
    /// A resolved value did not have the type its slot declared.
    TypeMismatch,
}

impl fmt::Display for MisuseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MisuseKind::GroupAsInput => "auto-group type used as an input",
            MisuseKind::PerScopeAsInput => "per-scope type used as an input",
            MisuseKind::SequenceAsGroupProducer => "sequence view provided for an auto-group type",
            MisuseKind::MapAsPerScopeProducer => "map view provided for a per-scope type",
            MisuseKind::TypeMismatch => "type mismatch",
        };
        f.write_str(s)
    }
}

/// Coarse classification of [`InjectError`], convenient for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidProvider,
    InvalidInvoker,
    DuplicateProvider,
    NoProvider,
    DependencyCycle,
    ScopeRequired,
    InvalidScope,
    Misuse(MisuseKind),
    Provider,
    Config,
}

/// Dependency injection errors.
///
/// Every failure of [`build`](crate::build) surfaces as one of these.
/// Nothing in the resolution path panics.
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{build, provide, InjectError, ErrorKind};
///
/// let err = build(|_: String| {}, provide(|| 1u8)).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::NoProvider);
/// assert!(matches!(err, InjectError::NoProvider { .. }));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// A provider signature cannot be wired.
    #[error("invalid provider {location}: {reason}")]
    InvalidProvider { location: Location, reason: String },

    /// The invoker returns something other than `()` or `Result<(), E>`.
    #[error("invoker {location} must not return any outputs, found {outputs}")]
    InvalidInvoker { location: Location, outputs: String },

    /// Two singular producers for one type.
    #[error("duplicate provision of type {type_name} by {location}\n\talready provided by {existing}")]
    DuplicateProvider {
        type_name: &'static str,
        location: Location,
        existing: String,
    },

    /// Two per-scope producers bound to the same scope.
    #[error("duplicate provision of per-scope type {type_name} in scope {scope} by {location}\n\talready provided by {existing}")]
    DuplicateProviderInScope {
        type_name: &'static str,
        scope: String,
        location: Location,
        existing: String,
    },

    /// A required slot has no registered resolver.
    #[error("can't resolve type {type_name} for {caller}:\n{stack}")]
    NoProvider {
        type_name: &'static str,
        caller: String,
        stack: String,
    },

    /// Resolution re-entered a `(type, scope)` pair that is still in progress.
    #[error("dependency cycle: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    /// Resolution nested deeper than the container allows.
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),

    /// A scope-parameterized type was requested outside of any scope.
    #[error("type {type_name} is provided per scope but {caller} is not inside of any scope")]
    ScopeRequired {
        type_name: &'static str,
        caller: String,
    },

    /// A provider was registered with a scope arrangement its resolver does not accept.
    #[error("invalid scope for {location}: {reason}")]
    InvalidScope { location: Location, reason: String },

    /// Misuse of auto-group or per-scope types.
    #[error("{kind}: {detail}")]
    Misuse { kind: MisuseKind, detail: String },

    /// A provider (or the invoker) returned an error.
    #[error("error calling provider {location}")]
    Provider {
        location: Location,
        #[source]
        source: BoxError,
    },

    /// An option reported an error while the container was being configured.
    #[error("configuration error: {0}")]
    Config(String),
}

impl InjectError {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InjectError::InvalidProvider { .. } => ErrorKind::InvalidProvider,
            InjectError::InvalidInvoker { .. } => ErrorKind::InvalidInvoker,
            InjectError::DuplicateProvider { .. } | InjectError::DuplicateProviderInScope { .. } => {
                ErrorKind::DuplicateProvider
            }
            InjectError::NoProvider { .. } => ErrorKind::NoProvider,
            InjectError::DependencyCycle { .. } | InjectError::DepthExceeded(_) => ErrorKind::DependencyCycle,
            InjectError::ScopeRequired { .. } => ErrorKind::ScopeRequired,
            InjectError::InvalidScope { .. } => ErrorKind::InvalidScope,
            InjectError::Misuse { kind, .. } => ErrorKind::Misuse(*kind),
            InjectError::Provider { .. } => ErrorKind::Provider,
            InjectError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn misuse(kind: MisuseKind, detail: impl Into<String>) -> Self {
        InjectError::Misuse { kind, detail: detail.into() }
    }

    pub(crate) fn invalid_provider(location: &Location, reason: impl Into<String>) -> Self {
        InjectError::InvalidProvider {
            location: location.clone(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_scope(location: &Location, reason: impl Into<String>) -> Self {
        InjectError::InvalidScope {
            location: location.clone(),
            reason: reason.into(),
        }
    }
}

/// Result type for container operations
///
/// # Examples
///
/// ```rust
/// use ferrous_inject::{InjectResult, InjectError};
///
/// fn check(flag: bool) -> InjectResult<()> {
///     if flag { Ok(()) } else { Err(InjectError::Config("disabled".into())) }
/// }
///
/// assert!(check(true).is_ok());
/// assert!(check(false).is_err());
/// ```
pub type InjectResult<T> = Result<T, InjectError>;
