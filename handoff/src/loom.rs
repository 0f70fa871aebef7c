#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::{FairLock, HandoffError, HandoffSlot};
    use loom::model::Builder;
    use loom::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use loom::sync::Arc;
    use loom::thread;

    fn builder() -> Builder {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }
        builder
    }

    #[test]
    fn test_fair_lock_mutual_exclusion() {
        builder().check(|| {
            let lock = Arc::new(FairLock::new());
            let inside = Arc::new(AtomicBool::new(false));
            let entries = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let lock = lock.clone();
                    let inside = inside.clone();
                    let entries = entries.clone();
                    thread::spawn(move || {
                        lock.acquire().unwrap();
                        assert!(!inside.swap(true, Ordering::SeqCst));
                        entries.fetch_add(1, Ordering::SeqCst);
                        inside.store(false, Ordering::SeqCst);
                        lock.release();
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(entries.load(Ordering::SeqCst), 2);
        });
    }

    #[test]
    fn test_fair_lock_cancel_reaches_waiter() {
        builder().check(|| {
            let lock = Arc::new(FairLock::locked());

            let waiter = {
                let lock = lock.clone();
                thread::spawn(move || lock.acquire())
            };

            lock.cancel();
            assert_eq!(waiter.join().unwrap(), Err(HandoffError::Cancelled));
        });
    }

    #[test]
    fn test_slot_preserves_order() {
        builder().check(|| {
            let slot = Arc::new(HandoffSlot::new());

            let producer = {
                let slot = slot.clone();
                thread::spawn(move || {
                    for i in 0..2 {
                        slot.put(i).unwrap();
                    }
                })
            };

            let mut received = vec![];
            while received.len() < 2 {
                match slot.try_take() {
                    Some(item) => received.push(item),
                    None => thread::yield_now(),
                }
            }

            producer.join().unwrap();
            assert_eq!(received, vec![0, 1]);
        });
    }

    #[test]
    fn test_slot_close_releases_producer() {
        builder().check(|| {
            let slot = Arc::new(HandoffSlot::new());
            slot.put(0).unwrap();

            let producer = {
                let slot = slot.clone();
                thread::spawn(move || slot.put(1))
            };

            slot.close();
            assert_eq!(producer.join().unwrap(), Err(HandoffError::Closed));
        });
    }
}
