use marketmaker_rs::pool::{BumpArena, MemoryPool, ObjectPool};
use std::sync::Arc;
use std::thread;

#[test]
fn outstanding_never_exceeds_capacity() {
    let pool: MemoryPool<u64, 16> = MemoryPool::new();
    let mut held = Vec::new();
    for i in 0..16 {
        held.push(pool.insert(i).unwrap());
    }
    assert_eq!(pool.outstanding(), 16);
    assert!(pool.insert(99).is_err());

    for handle in held {
        pool.take(handle);
    }
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn balanced_cycles_restore_full_capacity() {
    let pool: MemoryPool<String, 8> = MemoryPool::new();
    for round in 0..100 {
        let handles: Vec<_> = (0..8)
            .map(|i| pool.insert(format!("{round}-{i}")).unwrap())
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(pool.take(handle), format!("{round}-{i}"));
        }
    }
    // After every balanced cycle all 8 slots are available again.
    let full: Vec<_> = (0..8).map(|i| pool.insert(i.to_string()).unwrap()).collect();
    assert_eq!(full.len(), 8);
    for handle in full {
        pool.take(handle);
    }
}

#[test]
fn concurrent_object_pool_guards_return_on_drop() {
    let pool: Arc<ObjectPool<u64, 32>> = Arc::new(ObjectPool::new());
    let mut joins = Vec::new();
    for t in 0..4u64 {
        let pool = Arc::clone(&pool);
        joins.push(thread::spawn(move || {
            for i in 0..5_000 {
                if let Ok(guard) = pool.acquire(t * 10_000 + i) {
                    assert_eq!(*guard, t * 10_000 + i);
                    assert!(pool.outstanding() <= 32);
                }
            }
        }));
    }
    for join in joins {
        join.join().unwrap();
    }
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn distinct_allocations_hold_distinct_values() {
    let pool: MemoryPool<[u64; 4], 8> = MemoryPool::new();
    let handles: Vec<_> = (0..8u64).map(|i| pool.insert([i; 4]).unwrap()).collect();

    // Every outstanding slot still sees its own value: no aliasing.
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(pool.get(handle), &[i as u64; 4]);
    }
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(pool.take(handle), [i as u64; 4]);
    }
}

#[test]
fn bump_arena_frames() {
    let mut arena: BumpArena<256> = BumpArena::new();

    let frame: Vec<*mut u8> = (0..4)
        .map(|_| {
            let slice = arena.alloc_uninit::<u8>(32).expect("frame allocation");
            slice.as_mut_ptr() as *mut u8
        })
        .collect();
    // Distinct, non-overlapping regions within one frame.
    for window in frame.windows(2) {
        assert!((window[1] as usize) >= (window[0] as usize) + 32);
    }

    assert!(arena.alloc_uninit::<u8>(200).is_none());
    arena.reset();
    assert!(arena.alloc_uninit::<u8>(200).is_some());
}
