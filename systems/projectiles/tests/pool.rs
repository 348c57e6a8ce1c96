use std::collections::HashSet;

use rampart_system_projectiles::ProjectilePool;

#[test]
fn double_release_is_a_no_op() {
    let mut pool = ProjectilePool::with_prewarmed(1);
    let id = pool.acquire();

    assert!(pool.release(id), "first release returns the slot");
    assert!(!pool.release(id), "second release must be ignored");
    assert_eq!(pool.idle_count(), 1, "idle set must hold the slot once");

    let reacquired = pool.acquire();
    assert_eq!(reacquired, id);
    let fresh = pool.acquire();
    assert_ne!(fresh, id, "double release must not hand out one slot twice");
    assert_eq!(pool.capacity(), 2);
}

#[test]
fn active_slots_are_never_handed_out_twice() {
    let mut pool = ProjectilePool::with_prewarmed(3);
    let mut held = Vec::new();

    for round in 0..40 {
        if round % 3 == 2 {
            if let Some(id) = held.pop() {
                assert!(pool.release(id));
            }
        } else {
            held.push(pool.acquire());
        }

        let unique: HashSet<_> = held.iter().copied().collect();
        assert_eq!(unique.len(), held.len(), "active handles must be distinct");
        assert_eq!(pool.active_count(), held.len());
        assert!(pool.active_count() <= pool.capacity());
        assert_eq!(pool.active_ids().count(), held.len());
    }
}

#[test]
fn pool_never_shrinks() {
    let mut pool = ProjectilePool::new();
    let ids: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
    for id in ids {
        assert!(pool.release(id));
    }

    assert_eq!(pool.capacity(), 5);
    assert_eq!(pool.idle_count(), 5);
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn default_pool_is_prewarmed() {
    let pool = ProjectilePool::default();
    assert_eq!(pool.capacity(), rampart_system_projectiles::DEFAULT_PREWARM);
    assert_eq!(pool.active_count(), 0);
}
