use crate::pool::ArrayPool;
use std::ops::Deref;
use std::sync::Arc;

// Above this capacity growth switches from doubling to 1.5x.
const DOUBLING_LIMIT: usize = 4096;

/// Growable list whose backing buffers are rented from an [`ArrayPool`].
///
/// Overflow allocates a replacement buffer from the pool, copies live
/// elements across, and returns the old buffer; dropping the list returns
/// its buffer too. Steady-state use therefore allocates nothing.
#[derive(Debug)]
pub struct PooledVec<T> {
    pool: Arc<ArrayPool<T>>,
    buf: Vec<T>,
}

impl<T> PooledVec<T> {
    pub fn new(pool: Arc<ArrayPool<T>>) -> Self {
        let buf = pool.rent(1);
        Self { pool, buf }
    }

    pub fn with_capacity(pool: Arc<ArrayPool<T>>, capacity: usize) -> Self {
        let buf = pool.rent(capacity);
        Self { pool, buf }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn push(&mut self, value: T) {
        if self.buf.len() == self.buf.capacity() {
            self.grow(self.buf.len() + 1);
        }
        self.buf.push(value);
    }

    /// Drop current contents and swap in a buffer of at least `min_capacity`,
    /// returning the old buffer to the pool.
    pub fn renew(&mut self, min_capacity: usize) {
        if self.buf.capacity() >= min_capacity {
            self.buf.clear();
            return;
        }
        let fresh = self.pool.rent(min_capacity);
        let old = std::mem::replace(&mut self.buf, fresh);
        self.pool.give_back(old);
    }

    fn grow(&mut self, needed: usize) {
        let capacity = self.buf.capacity();
        let target = if capacity == 0 {
            8
        } else if capacity < DOUBLING_LIMIT {
            capacity * 2
        } else {
            capacity + capacity / 2
        };
        let mut fresh = self.pool.rent(target.max(needed));
        fresh.append(&mut self.buf);
        let old = std::mem::replace(&mut self.buf, fresh);
        self.pool.give_back(old);
    }
}

impl<T> Deref for PooledVec<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.buf
    }
}

impl<T> Drop for PooledVec<T> {
    fn drop(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        self.pool.give_back(buf);
    }
}
