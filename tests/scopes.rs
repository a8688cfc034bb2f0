use ferrous_inject::{
    build, configs, declare_auto_group, declare_per_scope, injectable, provide, provide_with_scope, ErrorKind,
    InjectError, MisuseKind, Scope,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Per-scope identity computed from the scope itself.
#[derive(Debug, Clone, PartialEq)]
struct ScopeKey(String);

#[derive(Debug, Clone, PartialEq)]
struct Handler(String);

injectable!(ScopeKey, Handler);

fn counting_key_provider(calls: Rc<Cell<usize>>) -> impl Fn(Scope) -> ScopeKey {
    move |scope: Scope| {
        calls.set(calls.get() + 1);
        ScopeKey(format!("key-{}", scope.name()))
    }
}

#[test]
fn test_scope_parameterized_runs_per_scope() {
    let (a, b) = (Scope::new("a"), Scope::new("b"));
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();

    build(
        move |handlers: Vec<Handler>| *s.borrow_mut() = handlers,
        configs([
            declare_auto_group::<Handler>(),
            provide(counting_key_provider(calls.clone())),
            provide_with_scope(&a, |key: ScopeKey| Handler(format!("f:{}", key.0))),
            provide_with_scope(&b, |key: ScopeKey| Handler(format!("g:{}", key.0))),
        ]),
    )
    .unwrap();

    assert_eq!(calls.get(), 2);
    assert_eq!(
        *seen.borrow(),
        vec![Handler("f:key-a".into()), Handler("g:key-b".into())]
    );
}

#[test]
fn test_scope_parameterized_memoized_within_scope() {
    let a = Scope::new("a");
    let calls = Rc::new(Cell::new(0));

    build(
        |_: Handler, _: String| {},
        configs([
            provide(counting_key_provider(calls.clone())),
            provide_with_scope(&a, |key: ScopeKey| Handler(key.0)),
            provide_with_scope(&a, |key: ScopeKey| key.0.to_uppercase()),
        ]),
    )
    .unwrap();

    assert_eq!(calls.get(), 1);
}

#[test]
fn test_scoped_provider_resolves_in_own_scope() {
    let api = Scope::new("api");

    build(
        |handler: Handler| assert_eq!(handler, Handler("key-api".into())),
        configs([
            provide(|scope: Scope| ScopeKey(format!("key-{}", scope))),
            provide_with_scope(&api, |key: ScopeKey| Handler(key.0)),
        ]),
    )
    .unwrap();
}

#[test]
fn test_scope_required_outside_scope() {
    let err = build(
        |_: ScopeKey| {},
        provide(|scope: Scope| ScopeKey(scope.name().to_string())),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ScopeRequired);
    assert!(err.to_string().contains("not inside of any scope"));
}

#[test]
fn test_scope_parameterized_bound_to_scope_rejected() {
    let a = Scope::new("a");
    let err = build(
        |_: ScopeKey| {},
        provide_with_scope(&a, |scope: Scope| ScopeKey(scope.name().to_string())),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidScope);
}

#[test]
fn test_scope_must_be_first_input() {
    let err = build(|_: u16| {}, provide(|n: u8, _: Scope| u16::from(n))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidProvider);
}

#[test]
fn test_invoker_cannot_take_scope() {
    let err = build(|_: Scope| {}, provide(|| 1u8)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidProvider);
}

#[test]
fn test_scopes_compare_by_identity() {
    let first = Scope::new("same");
    let second = Scope::new("same");
    let names = Rc::new(RefCell::new(Vec::new()));
    let n = names.clone();

    build(
        move |handlers: HashMap<Scope, Handler>| {
            let mut found: Vec<String> = handlers.into_values().map(|h| h.0).collect();
            found.sort();
            *n.borrow_mut() = found;
        },
        configs([
            declare_per_scope::<Handler>(),
            provide_with_scope(&first, || Handler("first".into())),
            provide_with_scope(&second, || Handler("second".into())),
        ]),
    )
    .unwrap();

    assert_eq!(*names.borrow(), vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn test_per_scope_round_trip() {
    let (a, b) = (Scope::new("a"), Scope::new("b"));
    let (ka, kb) = (a.clone(), b.clone());

    build(
        move |handlers: HashMap<Scope, Handler>| {
            assert_eq!(handlers.len(), 2);
            assert_eq!(handlers[&ka], Handler("f:key-a".into()));
            assert_eq!(handlers[&kb], Handler("g:key-b".into()));
        },
        configs([
            declare_per_scope::<Handler>(),
            provide(|scope: Scope| ScopeKey(format!("key-{}", scope.name()))),
            provide_with_scope(&a, |key: ScopeKey| Handler(format!("f:{}", key.0))),
            provide_with_scope(&b, |key: ScopeKey| Handler(format!("g:{}", key.0))),
        ]),
    )
    .unwrap();
}

#[test]
fn test_per_scope_empty_map() {
    build(
        |handlers: HashMap<Scope, Handler>| assert!(handlers.is_empty()),
        declare_per_scope::<Handler>(),
    )
    .unwrap();
}

#[test]
fn test_per_scope_duplicate_in_scope() {
    let a = Scope::new("a");
    let err = build(
        |_: HashMap<Scope, Handler>| {},
        configs([
            declare_per_scope::<Handler>(),
            provide_with_scope(&a, || Handler("one".into())),
            provide_with_scope(&a, || Handler("two".into())),
        ]),
    )
    .unwrap_err();

    match err {
        InjectError::DuplicateProviderInScope { scope, .. } => assert_eq!(scope, "a"),
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn test_per_scope_requires_scope() {
    let err = build(
        |_: HashMap<Scope, Handler>| {},
        configs([declare_per_scope::<Handler>(), provide(|| Handler("global".into()))]),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidScope);
}

#[test]
fn test_per_scope_element_as_input() {
    let a = Scope::new("a");
    let err = build(
        |_: Handler| {},
        configs([declare_per_scope::<Handler>(), provide_with_scope(&a, || Handler("a".into()))]),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Misuse(MisuseKind::PerScopeAsInput));
}

#[test]
fn test_per_scope_map_as_producer() {
    let err = build(
        |_: HashMap<Scope, Handler>| {},
        configs([
            declare_per_scope::<Handler>(),
            provide(|| HashMap::<Scope, Handler>::new()),
        ]),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Misuse(MisuseKind::MapAsPerScopeProducer));
}

#[test]
fn test_per_scope_declared_after_provider() {
    let a = Scope::new("a");
    let err = build(
        |_: HashMap<Scope, Handler>| {},
        configs([provide_with_scope(&a, || Handler("a".into())), declare_per_scope::<Handler>()]),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidProvider);
}
