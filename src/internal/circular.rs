//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{InjectError, InjectResult};
use crate::key::TypeKey;
use crate::location::Location;
use crate::scope::Scope;

const MAX_DEPTH: usize = 1024;

struct Frame {
    key: TypeKey,
    scope: Option<Scope>,
    caller: Location,
}

impl Frame {
    fn matches(&self, key: TypeKey, scope: Option<&Scope>) -> bool {
        self.key == key && self.scope.as_ref() == scope
    }

    fn describe(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{} in scope {}", self.key, scope),
            None => self.key.to_string(),
        }
    }
}

/// Stack of `(type, scope)` slots currently being resolved in one build.
#[derive(Default)]
pub(crate) struct ResolveStack {
    frames: RefCell<Vec<Frame>>,
}

impl ResolveStack {
    /// Pushes a frame, failing if the same slot is already in progress.
    pub(crate) fn enter(
        &self,
        key: TypeKey,
        scope: Option<&Scope>,
        caller: &Location,
    ) -> InjectResult<StackGuard<'_>> {
        let mut frames = self.frames.borrow_mut();

        // Circular detection BEFORE pushing the new frame
        if let Some(start) = frames.iter().position(|f| f.matches(key, scope)) {
            let mut path: Vec<String> = frames[start..].iter().map(Frame::describe).collect();
            path.push(frames[start].describe());
            return Err(InjectError::DependencyCycle { path });
        }

        if frames.len() >= MAX_DEPTH {
            return Err(InjectError::DepthExceeded(frames.len()));
        }

        frames.push(Frame {
            key,
            scope: scope.cloned(),
            caller: caller.clone(),
        });
        Ok(StackGuard { stack: self })
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// The frames below the innermost one, innermost first.
    pub(crate) fn describe(&self) -> String {
        let frames = self.frames.borrow();
        let outer = frames.len().saturating_sub(1);
        frames[..outer]
            .iter()
            .rev()
            .map(|f| format!("\twhile resolving {} for {}\n", f.describe(), f.caller))
            .collect()
    }
}

/// Pops its frame when dropped, on success and error paths alike.
pub(crate) struct StackGuard<'a> {
    stack: &'a ResolveStack,
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.stack.frames.borrow_mut().pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentry_is_a_cycle() {
        let stack = ResolveStack::default();
        let caller = Location::named("test");
        let _a = stack.enter(TypeKey::of::<u8>(), None, &caller).unwrap();
        let _b = stack.enter(TypeKey::of::<u16>(), None, &caller).unwrap();
        match stack.enter(TypeKey::of::<u8>(), None, &caller) {
            Err(InjectError::DependencyCycle { path }) => assert_eq!(path, vec!["u8", "u16", "u8"]),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("cycle not detected"),
        };
    }

    #[test]
    fn scopes_are_distinct_frames() {
        let stack = ResolveStack::default();
        let caller = Location::named("test");
        let scope = Scope::new("a");
        let _a = stack.enter(TypeKey::of::<u8>(), None, &caller).unwrap();
        let _b = stack.enter(TypeKey::of::<u8>(), Some(&scope), &caller).unwrap();
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn guard_pops_frame() {
        let stack = ResolveStack::default();
        let caller = Location::named("test");
        {
            let _a = stack.enter(TypeKey::of::<u8>(), None, &caller).unwrap();
            assert_eq!(stack.depth(), 1);
        }
        assert_eq!(stack.depth(), 0);
        assert!(stack.enter(TypeKey::of::<u8>(), None, &caller).is_ok());
    }

    #[test]
    fn depth_is_capped() {
        let stack = ResolveStack::default();
        let caller = Location::named("test");
        let scopes: Vec<Scope> = (0..MAX_DEPTH).map(|i| Scope::new(i.to_string())).collect();
        let guards: Vec<_> = scopes
            .iter()
            .map(|s| stack.enter(TypeKey::of::<u8>(), Some(s), &caller).unwrap())
            .collect();
        assert_eq!(guards.len(), MAX_DEPTH);
        assert!(matches!(
            stack.enter(TypeKey::of::<u16>(), None, &caller),
            Err(InjectError::DepthExceeded(MAX_DEPTH))
        ));
    }
}
