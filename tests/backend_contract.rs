// ==============================================
// BACKEND CONTRACT TESTS (integration)
// ==============================================
//
// Every backend, and every backend wrapped in an expiration decorator, must
// satisfy the same observable contract when used from a single thread.

use std::sync::Arc;
use std::time::Duration;

use memokit::builder::{Backend, MemoizeOptions};
use memokit::error::CacheError;
use memokit::state::ResultState;
use memokit::store::{ExpiringCache, LockedCache, PerKeyCache, ThreadLocalCache, UnsyncCache};
use memokit::traits::Cache;

type Fail = &'static str;

fn check_contract<C: Cache<u32, String, Fail>>(name: &str, cache: &C) {
    // save then read
    assert!(!cache.has_value(&1), "{name}: fresh cache has values");
    assert!(cache.get_value(&1).unwrap_err().is_not_found(), "{name}");
    cache.save_value(&1, "one".to_string());
    assert!(cache.has_value(&1), "{name}");
    assert_eq!(cache.get_value(&1).unwrap(), "one", "{name}");

    // overwrite
    cache.save_value(&1, "uno".to_string());
    assert_eq!(cache.get_value(&1).unwrap(), "uno", "{name}");

    // failures keep identity
    let boom = Arc::new("boom");
    cache.save_error(&2, Arc::clone(&boom));
    assert!(cache.has_value(&2), "{name}");
    match cache.get_value(&2) {
        Err(CacheError::Cached(e)) => assert!(Arc::ptr_eq(&e, &boom), "{name}"),
        other => panic!("{name}: expected cached failure, got {other:?}"),
    }
    assert_eq!(cache.read_state(&2), ResultState::failure(Arc::clone(&boom)), "{name}");

    // many keys
    for k in 10..60 {
        cache.save_value(&k, format!("v{k}"));
    }
    for k in 10..60 {
        assert_eq!(cache.get_value(&k).unwrap(), format!("v{k}"), "{name}");
    }

    // forget is idempotent and touches only its key
    cache.forget(&1);
    cache.forget(&1);
    cache.forget(&999);
    assert!(!cache.has_value(&1), "{name}");
    assert!(cache.has_value(&2), "{name}");

    // transform sees the state and can write through
    let was_absent = cache.read_and_transform(&3, |state| {
        let absent = state.is_absent();
        cache.save_value(&3, "three".to_string());
        absent
    });
    assert!(was_absent, "{name}");
    let seen = cache.read_and_transform(&3, |state| state.into_value());
    assert_eq!(seen.unwrap(), "three", "{name}");

    // reset drops everything
    cache.reset();
    for k in [1, 2, 3, 10, 59] {
        assert!(!cache.has_value(&k), "{name}: key {k} survived reset");
    }

    // usable after reset
    cache.save_value(&1, "again".to_string());
    assert_eq!(cache.get_value(&1).unwrap(), "again", "{name}");
}

#[test]
fn unsync_satisfies_contract() {
    check_contract("unsync", &UnsyncCache::new());
}

#[test]
fn thread_local_satisfies_contract() {
    check_contract("thread_local", &ThreadLocalCache::new());
}

#[test]
fn locked_satisfies_contract() {
    check_contract("locked", &LockedCache::new());
}

#[test]
fn per_key_satisfies_contract() {
    check_contract("per_key", &PerKeyCache::new());
}

#[test]
fn expiring_wrappers_satisfy_contract() {
    let ttl = Duration::from_secs(10);
    check_contract("expiring(unsync)", &ExpiringCache::new(UnsyncCache::new(), ttl));
    check_contract("expiring(thread_local)", &ExpiringCache::new(ThreadLocalCache::new(), ttl));
    check_contract("expiring(locked)", &ExpiringCache::new(LockedCache::new(), ttl));
    check_contract("expiring(per_key)", &ExpiringCache::new(PerKeyCache::new(), ttl));
}

#[test]
fn built_caches_satisfy_contract() {
    for backend in [Backend::ThreadLocal, Backend::Locked, Backend::PerKey] {
        let plain = MemoizeOptions::new()
            .backend(backend)
            .try_build_cache::<u32, String, Fail>()
            .unwrap();
        check_contract(&format!("{backend:?}"), &plain);

        let expiring = MemoizeOptions::new()
            .backend(backend)
            .expire_after(Duration::from_secs(10))
            .try_build_cache::<u32, String, Fail>()
            .unwrap();
        check_contract(&format!("{backend:?}+expiring"), &expiring);
    }
}

#[test]
fn shared_handle_satisfies_contract() {
    let cache = Arc::new(PerKeyCache::new());
    check_contract("arc(per_key)", &cache);
}
