use cellar_di::{
    DiError, DynamicCell, Key, Lifetime, Registry, Resolver, ServiceCollection, ServiceDescriptor,
    ServiceProvider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Database;
struct Repository;
struct Controller;

#[test]
fn test_not_found_names_requested_type() {
    let sp = ServiceCollection::new().build();
    match sp.get::<Database>() {
        Err(DiError::NotFound(name)) => assert!(name.ends_with("Database")),
        _ => panic!("expected NotFound"),
    }
}

#[test]
fn test_missing_dependency_reports_not_found() {
    let mut sc = ServiceCollection::new();
    sc.add(
        ServiceDescriptor::singleton(|r| {
            r.get::<Database>()?;
            Ok(Repository)
        })
        .depends_on::<Database>(),
    );

    let sp = sc.build();
    assert!(sp.has::<Repository>());
    assert!(!sp.has::<Database>());

    let err = sp.get::<Repository>().err().unwrap();
    assert!(matches!(err, DiError::NotFound(_)));
    assert!(err.type_name().ends_with("Database"));
}

#[test]
fn test_dependency_chain_propagates_first_error() {
    let built = Arc::new(AtomicUsize::new(0));
    let built_repo = built.clone();
    let built_ctrl = built.clone();

    let mut sc = ServiceCollection::new();
    sc.add(
        ServiceDescriptor::scoped(move |r| {
            r.get::<Database>()?;
            built_repo.fetch_add(1, Ordering::SeqCst);
            Ok(Repository)
        })
        .depends_on::<Database>(),
    );
    sc.add(
        ServiceDescriptor::scoped(move |r| {
            r.get::<Repository>()?;
            built_ctrl.fetch_add(1, Ordering::SeqCst);
            Ok(Controller)
        })
        .depends_on::<Repository>(),
    );

    let sp = sc.build();
    let scope = sp.create_scope();

    let err = scope.get::<Controller>().err().unwrap();
    assert!(err.type_name().ends_with("Database"));
    assert_eq!(built.load(Ordering::SeqCst), 0);
    assert_eq!(scope.cached_count(), 0);

    // Failures are not cached either: the next attempt runs the loaders again.
    assert!(scope.get::<Controller>().is_err());
    assert_eq!(scope.cached_count(), 0);
}

#[test]
fn test_incompatible_descriptor() {
    let mut registry = Registry::new();
    registry.add(Key::of::<u32>(), ServiceDescriptor::transient(|_| Ok(String::from("not a u32"))));

    let sp = ServiceProvider::new(registry);
    assert!(sp.has::<u32>());
    match sp.get::<u32>() {
        Err(DiError::IncompatibleDescriptor(name)) => assert_eq!(name, "u32"),
        _ => panic!("expected IncompatibleDescriptor"),
    }
}

#[test]
fn test_mismatched_type_from_raw_loader() {
    let mut sc = ServiceCollection::new();
    sc.add(ServiceDescriptor::<u32>::from_loader(Lifetime::Transient, |_| {
        Ok(DynamicCell::new(1u64))
    }));
    sc.add_keyed(
        cellar_di::key("cached"),
        ServiceDescriptor::<u32>::from_loader(Lifetime::Singleton, |_| Ok(DynamicCell::empty())),
    );

    let sp = sc.build();
    assert_eq!(sp.get::<u32>().err(), Some(DiError::MismatchedType("u32")));
    assert_eq!(
        sp.get_keyed::<u32>(cellar_di::key("cached")).err(),
        Some(DiError::MismatchedType("u32"))
    );
    assert_eq!(sp.singleton_count(), 0);
}

#[test]
fn test_raw_loader_with_correct_type_resolves() {
    let mut sc = ServiceCollection::new();
    sc.add(ServiceDescriptor::<u32>::from_loader(Lifetime::Singleton, |_| {
        Ok(DynamicCell::new(9u32))
    }));

    let sp = sc.build();
    assert_eq!(*sp.get_required::<u32>(), 9);
}

#[test]
fn test_plural_read_reports_each_entry() {
    let mut sc = ServiceCollection::new();
    sc.add_transient_factory(|_| Ok(1u8));
    sc.add_transient_factory(|r| {
        r.get::<Database>()?;
        Ok(2u8)
    });
    sc.add_singleton_factory(|_| Ok(3u8));

    let sp = sc.build();

    let mut seen = Vec::new();
    let mut failures = 0;
    sp.for_each::<u8, _>(|entry| match entry {
        Ok(value) => seen.push(*value),
        Err(DiError::NotFound(_)) => failures += 1,
        Err(other) => panic!("unexpected error: {other}"),
    });
    assert_eq!(seen, [1, 3]);
    assert_eq!(failures, 1);

    let all = sp.get_all::<u8>();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].as_deref().copied(), Ok(1));
    assert!(matches!(all[1], Err(DiError::NotFound(name)) if name.ends_with("Database")));
    assert_eq!(all[2].as_deref().copied(), Ok(3));
    assert_eq!(sp.singleton_count(), 1);
}

#[test]
fn test_reentrant_loader_is_circular() {
    let mut sc = ServiceCollection::new();
    // Undeclared self-dependency; build-time validation cannot see it.
    sc.add_singleton_factory(|r| {
        r.get::<Database>()?;
        Ok(Database)
    });

    let sp = sc.build();
    match sp.get::<Database>() {
        Err(DiError::Circular(path)) => {
            assert_eq!(path.len(), 2);
            assert!(path[0].ends_with("Database"));
        }
        _ => panic!("expected Circular"),
    }
    assert_eq!(sp.singleton_count(), 0);
}

#[test]
fn test_loader_errors_pass_through_unchanged() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Database, _>(|_| Err(DiError::NotFound("external config")));

    let sp = sc.build();
    assert_eq!(sp.get::<Database>().err(), Some(DiError::NotFound("external config")));
}

#[test]
fn test_error_messages() {
    assert_eq!(DiError::NotFound("A").to_string(), "Service not found: A");
    assert_eq!(
        DiError::IncompatibleDescriptor("A").to_string(),
        "Incompatible service descriptor: A"
    );
    assert_eq!(DiError::MismatchedType("A").to_string(), "Mismatched service type: A");
    assert_eq!(DiError::Circular(vec!["A", "B", "A"]).type_name(), "A");
}
