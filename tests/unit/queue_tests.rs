use marketmaker_rs::queue::{MpmcQueue, SpscQueue};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

#[test]
fn spsc_never_fails_spuriously_when_not_full() {
    // From the sole producer, a non-full queue must accept every push;
    // from the sole consumer, a non-empty queue must serve every pop.
    let q: SpscQueue<u32, 64> = SpscQueue::new();
    for round in 0..100 {
        for i in 0..64 {
            assert!(q.try_push(round * 64 + i).is_ok(), "push into non-full");
        }
        assert!(q.try_push(u32::MAX).is_err());
        for i in 0..64 {
            assert_eq!(q.try_pop(), Some(round * 64 + i), "pop from non-empty");
        }
        assert_eq!(q.try_pop(), None);
    }
}

#[test]
fn spsc_keeps_fifo_under_concurrent_load() {
    let q: Arc<SpscQueue<u64, 8>> = Arc::new(SpscQueue::new());
    let producer_q = Arc::clone(&q);
    let consumer_q = Arc::clone(&q);

    let producer = thread::spawn(move || {
        let mut pushed = 0u64;
        while pushed < 10_000 {
            if producer_q.try_push(pushed).is_ok() {
                pushed += 1;
            }
        }
    });
    let consumer = thread::spawn(move || {
        let mut expected = 0u64;
        while expected < 10_000 {
            if let Some(value) = consumer_q.try_pop() {
                assert_eq!(value, expected);
                expected += 1;
            }
        }
    });

    producer.join().unwrap();
    consumer.join().unwrap();
}

#[test]
fn mpmc_conserves_items_across_threads() {
    const PRODUCERS: u64 = 3;
    const PER_PRODUCER: u64 = 20_000;

    let q: Arc<MpmcQueue<u64>> = Arc::new(MpmcQueue::with_capacity(128));
    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let q = Arc::clone(&q);
        producers.push(thread::spawn(move || {
            for i in 0..PER_PRODUCER {
                let item = p * PER_PRODUCER + i;
                while q.try_push(item).is_err() {
                    std::hint::spin_loop();
                }
            }
        }));
    }

    let collector = {
        let q = Arc::clone(&q);
        thread::spawn(move || {
            let mut seen = HashSet::new();
            while seen.len() < (PRODUCERS * PER_PRODUCER) as usize {
                if let Some(item) = q.try_pop() {
                    assert!(seen.insert(item), "duplicate item {item}");
                }
            }
            seen
        })
    };

    for p in producers {
        p.join().unwrap();
    }
    let seen = collector.join().unwrap();
    assert_eq!(seen.len(), (PRODUCERS * PER_PRODUCER) as usize);
    assert!(q.is_empty());
}

#[test]
fn mpmc_full_and_empty_are_genuine() {
    let q: MpmcQueue<u8> = MpmcQueue::with_capacity(4);
    assert_eq!(q.try_pop(), None);
    for i in 0..4 {
        q.try_push(i).unwrap();
    }
    assert_eq!(q.try_push(9), Err(9));
    assert_eq!(q.len(), 4);
}
