//! Shared pool of byte buffers for frame assembly.

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

const DEFAULT_RETAINED: usize = 32;

/// Thread-safe store of reusable `Vec<u8>` buffers.
#[derive(Debug)]
pub struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    retained: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RETAINED)
    }
}

impl BufferPool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A pool keeping at most `retained` idle buffers.
    pub fn with_capacity(retained: usize) -> Self {
        Self { free: Mutex::new(Vec::new()), retained }
    }

    /// Take an empty buffer able to hold at least `min_capacity` bytes.
    pub fn rent(self: &Arc<Self>, min_capacity: usize) -> PooledBuffer {
        let recycled = self.free.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let mut buf = recycled.unwrap_or_default();
        buf.reserve(min_capacity);
        PooledBuffer { buf, pool: Arc::clone(self) }
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn give_back(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.retained {
            free.push(buf);
        }
    }
}

/// A buffer rented from a [`BufferPool`], returned on drop.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.give_back(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_come_back_cleared() {
        let pool = BufferPool::new();
        let mut buf = pool.rent(64);
        buf.extend_from_slice(b"frame");
        let ptr = buf.as_ptr();
        drop(buf);
        assert_eq!(pool.idle(), 1);

        let again = pool.rent(8);
        assert!(again.is_empty());
        assert_eq!(again.as_ptr(), ptr);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn retention_is_bounded() {
        let pool = Arc::new(BufferPool::with_capacity(2));
        let rented: Vec<_> = (0..4).map(|_| pool.rent(16)).collect();
        drop(rented);
        assert_eq!(pool.idle(), 2);
    }
}
