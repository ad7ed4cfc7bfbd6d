use cellar_di::{Injected, Resolver, Scope, ServiceCollection, ServiceProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Config {
    name: &'static str,
}

struct RequestContext {
    id: usize,
}

fn provider(counter: Arc<AtomicUsize>) -> ServiceProvider {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory(|_| Ok(Config { name: "app" }));
    sc.add_scoped_factory(move |_| {
        Ok(RequestContext {
            id: counter.fetch_add(1, Ordering::SeqCst),
        })
    });
    sc.build()
}

#[test]
fn test_scope_isolation() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter.clone());

    let scope1 = sp.create_scope();
    let scope2 = sp.create_scope();

    let r1 = scope1.get_required::<RequestContext>();
    let r2 = scope2.get_required::<RequestContext>();
    assert!(!Injected::ptr_eq(&r1, &r2));
    assert_ne!(r1.id, r2.id);

    let c1 = scope1.get_required::<Config>();
    let c2 = scope2.get_required::<Config>();
    assert!(Injected::ptr_eq(&c1, &c2));
    assert_eq!(c1.name, "app");
}

#[test]
fn test_scoped_instance_stable_within_scope() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter.clone());
    let scope = sp.create_scope();

    let a = scope.get_required::<RequestContext>();
    let b = scope.get_required::<RequestContext>();
    assert!(Injected::ptr_eq(&a, &b));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(scope.cached_count(), 1);
}

#[test]
fn test_sibling_scope_starts_empty() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter.clone());
    let scope = sp.create_scope();
    scope.get_required::<RequestContext>();

    let sibling = scope.create_scope();
    assert_eq!(sibling.cached_count(), 0);

    let a = scope.get_required::<RequestContext>();
    let b = sibling.get_required::<RequestContext>();
    assert!(!Injected::ptr_eq(&a, &b));
    assert!(Injected::ptr_eq(
        &scope.get_required::<Config>(),
        &sibling.get_required::<Config>()
    ));
}

#[test]
fn test_scope_move_keeps_cached_instances() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter.clone());

    let scope = sp.create_scope();
    let before = scope.get_required::<RequestContext>().into_shared();

    let moved: Scope<'_> = scope;
    let boxed = Box::new(moved);
    let after = boxed.get_required::<RequestContext>().into_shared();

    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_provider_move_keeps_singletons() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter);
    let before = sp.get_required::<Config>().into_shared();

    let moved = sp;
    let after = moved.get_required::<Config>().into_shared();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn test_provider_root_scope_caches_scoped_services() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter.clone());

    let a = sp.get_required::<RequestContext>();
    let b = sp.get_required::<RequestContext>();
    assert!(Injected::ptr_eq(&a, &b));

    let scope = sp.create_scope();
    let c = scope.get_required::<RequestContext>();
    assert!(!Injected::ptr_eq(&a, &c));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dropping_scope_releases_scoped_instances() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter);

    let held = {
        let scope = sp.create_scope();
        scope.get_required::<RequestContext>().into_shared()
    };

    assert_eq!(Arc::strong_count(&held), 1);
}

#[test]
fn test_caller_handle_outlives_provider() {
    let counter = Arc::new(AtomicUsize::new(0));
    let sp = provider(counter);

    let (weak, held) = {
        let scope = sp.create_scope();
        let handle = scope.get_required::<RequestContext>().into_shared();
        (Arc::downgrade(&handle), handle)
    };
    drop(sp);

    // The caches are gone; only the caller's handle remains.
    assert_eq!(Arc::strong_count(&held), 1);
    assert_eq!(held.id, 0);
    drop(held);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_scoped_dependency_follows_resolving_scope() {
    struct Handler {
        request: Arc<RequestContext>,
    }

    let counter = Arc::new(AtomicUsize::new(0));
    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory(move |_| {
        Ok(RequestContext {
            id: counter.fetch_add(1, Ordering::SeqCst),
        })
    });
    sc.add_transient_factory(|r| {
        Ok(Handler {
            request: r.get::<RequestContext>()?.into_shared(),
        })
    });

    let sp = sc.build();
    let scope1 = sp.create_scope();
    let scope2 = sp.create_scope();

    let h1 = scope1.get_required::<Handler>();
    let h2 = scope2.get_required::<Handler>();
    assert_ne!(h1.request.id, h2.request.id);
    assert!(Arc::ptr_eq(
        &h1.request,
        &scope1.get_required::<RequestContext>().into_shared()
    ));
}
