// ============================================================================
// SPSC Ring
// Bounded lock-free single-producer / single-consumer queue
// ============================================================================

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared ring state.
///
/// `head` and `tail` are free-running counters masked into the buffer, so
/// `tail - head` is the live length and a full ring never collides with an
/// empty one. The producer writes a slot before releasing `tail`; the
/// consumer acquires `tail` before reading, which is the publication edge
/// that makes the write visible.
struct Inner<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,

    /// Next slot to pop; written by the consumer only
    head: CachePadded<AtomicUsize>,

    /// Next slot to push; written by the producer only
    tail: CachePadded<AtomicUsize>,
}

// The raw slots are only ever touched by the single producer (writes at
// `tail`) or the single consumer (reads at `head`), never both at once.
unsafe impl<T: Send> Sync for Inner<T> {}

impl<T> Inner<T> {
    fn capacity(&self) -> usize {
        self.buffer.len()
    }

    fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let mut head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        while head != tail {
            unsafe {
                (*self.buffer[head & self.mask].get()).assume_init_drop();
            }
            head = head.wrapping_add(1);
        }
    }
}

/// Create a ring of the given capacity and split it into its two endpoints.
///
/// Capacity must be a non-zero power of two. Exactly one `Producer` and one
/// `Consumer` exist per ring; neither is cloneable, so the single-pusher /
/// single-popper contract is enforced by ownership.
pub fn ring<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    assert!(
        capacity.is_power_of_two(),
        "ring capacity must be a non-zero power of two, got {capacity}"
    );

    let buffer = (0..capacity)
        .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
        .collect::<Vec<_>>()
        .into_boxed_slice();

    let inner = Arc::new(Inner {
        buffer,
        mask: capacity - 1,
        head: CachePadded::new(AtomicUsize::new(0)),
        tail: CachePadded::new(AtomicUsize::new(0)),
    });

    (
        Producer {
            inner: Arc::clone(&inner),
        },
        Consumer { inner },
    )
}

// ============================================================================
// Producer Endpoint
// ============================================================================

/// Producer half of the ring.
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Producer<T> {
    /// Push without blocking.
    ///
    /// # Errors
    /// Returns the value back when the ring is full; the caller decides
    /// whether to retry, shed, or spin.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let inner = &*self.inner;
        let tail = inner.tail.load(Ordering::Relaxed);
        let head = inner.head.load(Ordering::Acquire);

        if tail.wrapping_sub(head) == inner.capacity() {
            return Err(value);
        }

        unsafe {
            (*inner.buffer[tail & inner.mask].get()).write(value);
        }
        inner.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Whether the consumer has drained everything pushed so far.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

// ============================================================================
// Consumer Endpoint
// ============================================================================

/// Consumer half of the ring.
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Consumer<T> {
    /// Pop without blocking. Returns `None` when the ring is empty.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let inner = &*self.inner;
        let head = inner.head.load(Ordering::Relaxed);
        let tail = inner.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        let value = unsafe { (*inner.buffer[head & inner.mask].get()).assume_init_read() };
        inner.head.store(head.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len() == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let (mut producer, mut consumer) = ring(4);

        producer.try_push(1).unwrap();
        producer.try_push(2).unwrap();
        producer.try_push(3).unwrap();

        assert_eq!(consumer.try_pop(), Some(1));
        assert_eq!(consumer.try_pop(), Some(2));
        assert_eq!(consumer.try_pop(), Some(3));
        assert_eq!(consumer.try_pop(), None);
    }

    #[test]
    fn test_full_ring_returns_value() {
        let (mut producer, mut consumer) = ring(2);

        producer.try_push(1).unwrap();
        producer.try_push(2).unwrap();
        assert_eq!(producer.try_push(3), Err(3));
        assert_eq!(producer.len(), 2);

        assert_eq!(consumer.try_pop(), Some(1));
        producer.try_push(3).unwrap();
        assert_eq!(consumer.try_pop(), Some(2));
        assert_eq!(consumer.try_pop(), Some(3));
    }

    #[test]
    fn test_wraparound() {
        let (mut producer, mut consumer) = ring(4);

        for round in 0u64..10 {
            for i in 0..3 {
                producer.try_push(round * 3 + i).unwrap();
            }
            for i in 0..3 {
                assert_eq!(consumer.try_pop(), Some(round * 3 + i));
            }
        }
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_drop_releases_undrained_items() {
        let (mut producer, consumer) = ring(8);
        let item = Arc::new(());

        for _ in 0..5 {
            producer.try_push(Arc::clone(&item)).unwrap();
        }
        drop(producer);
        drop(consumer);

        assert_eq!(Arc::strong_count(&item), 1);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_rejects_non_power_of_two_capacity() {
        let _ = ring::<u64>(1000);
    }

    #[test]
    fn test_cross_thread_transfer_preserves_order_and_count() {
        const COUNT: u64 = 100_000;
        let (mut producer, mut consumer) = ring(256);

        let pusher = thread::spawn(move || {
            for i in 0..COUNT {
                let mut value = i;
                loop {
                    match producer.try_push(value) {
                        Ok(()) => break,
                        Err(back) => {
                            value = back;
                            std::hint::spin_loop();
                        }
                    }
                }
            }
        });

        let mut popped = 0u64;
        while popped < COUNT {
            if let Some(value) = consumer.try_pop() {
                assert_eq!(value, popped);
                popped += 1;
            } else {
                std::hint::spin_loop();
            }
        }

        pusher.join().unwrap();
        assert_eq!(popped, COUNT);
        assert!(consumer.is_empty());
    }
}
