use ferrous_inject::{
    aggregate_input, build, configs, inject, injectable, provide, provide_with_scope, ErrorKind, InjectError, Scope,
};

#[derive(Debug, Clone)]
struct Alpha;

#[derive(Debug, Clone)]
struct Beta;

injectable!(Alpha, Beta);

aggregate_input! {
    struct Limits {
        #[optional]
        max: i32,
    }
}

aggregate_input! {
    struct StrictLimits {
        max: i32,
    }
}

fn make_alpha(_: Beta) -> Alpha {
    Alpha
}

fn make_beta(_: Alpha) -> Beta {
    Beta
}

#[test]
fn test_duplicate_provider_names_both_locations() {
    let err = build(
        |_: u32| {},
        configs([provide(|| 1u32), provide(|| 2u32)]),
    )
    .unwrap_err();

    match &err {
        InjectError::DuplicateProvider { type_name, location, existing } => {
            assert_eq!(*type_name, "u32");
            assert!(location.to_string().contains("resolution_errors.rs"));
            assert!(existing.contains("resolution_errors.rs"));
        }
        other => panic!("unexpected error {}", other),
    }
    let message = err.to_string();
    assert!(message.contains("duplicate provision of type u32"));
    assert!(message.contains("already provided by"));
}

#[test]
fn test_duplicate_within_one_provider_tuple() {
    let err = build(|_: String| {}, provide((|| "a".to_string(), || "b".to_string()))).unwrap_err();

    match &err {
        InjectError::DuplicateProvider { location, existing, .. } => {
            let location = location.to_string();
            assert_ne!(&location, existing);
            assert!(existing.contains(" #0 ("), "{}", existing);
            assert!(location.contains(" #1 ("), "{}", location);
        }
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn test_duplicate_on_one_line_names_distinct_columns() {
    let err = build(|_: u32| {}, configs([provide(|| 1u32), provide(|| 2u32)])).unwrap_err();

    match &err {
        InjectError::DuplicateProvider { location, existing, .. } => {
            assert_ne!(&location.to_string(), existing);
        }
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn test_duplicate_from_tuple_outputs() {
    let err = build(|_: u8| {}, configs([provide(|| 1u8), provide(|| (2u8, 'c'))])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateProvider);
}

#[test]
fn test_duplicate_across_scopes() {
    let (a, b) = (Scope::new("a"), Scope::new("b"));
    let err = build(
        |_: u8| {},
        configs([provide_with_scope(&a, || 1u8), provide_with_scope(&b, || 2u8)]),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateProvider);
}

#[test]
fn test_dependency_cycle() {
    let err = build(|_: Alpha| {}, configs([provide(make_alpha), provide(make_beta)])).unwrap_err();

    match &err {
        InjectError::DependencyCycle { path } => {
            assert_eq!(path.len(), 3);
            assert!(path[0].contains("Alpha"));
            assert!(path[1].contains("Beta"));
            assert_eq!(path[0], path[2]);
        }
        other => panic!("unexpected error {}", other),
    }
    assert!(err.to_string().contains("->"));
}

#[test]
fn test_self_dependency() {
    let err = build(|_: u8| {}, provide(|n: u8| n + 1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependencyCycle);
}

#[test]
fn test_cycle_through_scope_parameterized_provider() {
    let a = Scope::new("a");
    let err = build(
        |_: u16| {},
        configs([
            provide(|_: Scope, n: u8| u64::from(n)),
            provide_with_scope(&a, |n: u64| n as u8),
            provide_with_scope(&a, |n: u8| u16::from(n)),
        ]),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyCycle);
}

#[test]
fn test_optional_missing_gets_zero() {
    let limits: Limits = inject(provide(|| "unrelated".to_string())).unwrap();
    assert_eq!(limits.max, 0);
}

#[test]
fn test_required_missing_fails() {
    let err = build(|limits: StrictLimits| assert_eq!(limits.max, 0), provide(|| 1u8)).unwrap_err();
    match err {
        InjectError::NoProvider { type_name, .. } => assert_eq!(type_name, "i32"),
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn test_fn_items_as_providers() {
    let _: Alpha = inject(configs([provide(|| Beta), provide(make_alpha)])).unwrap();
    let _: (Alpha, Beta) = inject(configs([provide(|| Alpha), provide(make_beta)])).unwrap();
}
