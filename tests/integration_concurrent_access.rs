//! Concurrent access integration tests
//!
//! Resolution from several threads against a finished provider. Singletons
//! stay unique and scopes stay isolated. A racing first resolution runs the
//! loader once.

use cellar_di::{Injected, Resolver, ServiceCollection};
use crossbeam_utils::thread;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

#[derive(Debug)]
struct CounterService {
    count: AtomicUsize,
}

impl CounterService {
    fn increment(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }
}

struct RequestState {
    owner: usize,
}

#[test]
fn test_concurrent_singleton_resolution_is_unique() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory(|_| Ok(CounterService { count: AtomicUsize::new(0) }));
    let sp = sc.build();

    let barrier = Barrier::new(8);
    let instances: Vec<Arc<CounterService>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    let service = sp.get_required::<CounterService>();
                    for _ in 0..100 {
                        service.increment();
                    }
                    service.into_shared()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
    assert_eq!(instances[0].count.load(Ordering::SeqCst), 800);
    assert_eq!(sp.singleton_count(), 1);
}

#[test]
fn test_racing_first_resolution_keeps_one_instance() {
    let builds = Arc::new(AtomicUsize::new(0));
    let builds_clone = builds.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory(move |_| {
        builds_clone.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(5));
        Ok(CounterService { count: AtomicUsize::new(0) })
    });
    let sp = sc.build();

    let barrier = Barrier::new(16);
    thread::scope(|s| {
        for _ in 0..16 {
            s.spawn(|_| {
                barrier.wait();
                sp.get_required::<CounterService>().increment();
            });
        }
    })
    .unwrap();

    // Racing callers wait for the single build.
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(sp.singleton_count(), 1);
    assert_eq!(sp.get_required::<CounterService>().count.load(Ordering::SeqCst), 16);
}

#[test]
fn test_scopes_on_separate_threads_are_isolated() {
    let next = Arc::new(AtomicUsize::new(0));
    let next_clone = next.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory(move |_| {
        Ok(RequestState {
            owner: next_clone.fetch_add(1, Ordering::SeqCst),
        })
    });
    let sp = sc.build();

    let owners: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|_| {
                    let scope = sp.create_scope();
                    let first = scope.get_required::<RequestState>();
                    for _ in 0..50 {
                        let again = scope.get_required::<RequestState>();
                        assert!(Injected::ptr_eq(&first, &again));
                    }
                    first.owner
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    let mut sorted = owners.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 4);
    assert_eq!(next.load(Ordering::SeqCst), 4);
}

#[test]
fn test_shared_scope_across_threads() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory(|_| Ok(CounterService { count: AtomicUsize::new(0) }));
    let sp = sc.build();
    let scope = sp.create_scope();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|_| {
                for _ in 0..25 {
                    scope.get_required::<CounterService>().increment();
                }
            });
        }
    })
    .unwrap();

    assert_eq!(scope.cached_count(), 1);
    assert_eq!(scope.get_required::<CounterService>().count.load(Ordering::SeqCst), 100);
}
