//! Pre-allocated byte-buffer pool for the hot decode path: avoids an
//! allocation per account update by reusing fixed size-class buffers
//!.

use std::sync::Mutex;

const SIZE_CLASSES: [usize; 6] = [64, 256, 1024, 4096, 16_384, 65_536];

pub struct BufferPool {
    classes: Vec<Mutex<Vec<Vec<u8>>>>,
}

/// A checked-out buffer. Cleared but not shrunk on `release`, and dropped
/// (not returned) if it doesn't match a size class exactly, so a pool that
/// grows unusually large buffers for one spike doesn't hold onto them.
pub struct PooledBuffer {
    pub buf: Vec<u8>,
    class_index: Option<usize>,
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool { classes: SIZE_CLASSES.iter().map(|_| Mutex::new(Vec::new())).collect() }
    }

    fn class_for(n: usize) -> Option<usize> {
        SIZE_CLASSES.iter().position(|&cap| cap >= n)
    }

    /// Acquires a buffer with capacity at least `n`. Falls back to a plain
    /// non-pooled allocation when `n` exceeds every size class.
    pub fn acquire(&self, n: usize) -> PooledBuffer {
        match Self::class_for(n) {
            Some(idx) => {
                let mut slots = self.classes[idx].lock().unwrap();
                let buf = slots.pop().unwrap_or_else(|| Vec::with_capacity(SIZE_CLASSES[idx]));
                PooledBuffer { buf, class_index: Some(idx) }
            }
            None => PooledBuffer { buf: Vec::with_capacity(n), class_index: None },
        }
    }

    pub fn release(&self, mut buffer: PooledBuffer) {
        if let Some(idx) = buffer.class_index {
            buffer.buf.clear();
            self.classes[idx].lock().unwrap().push(buffer.buf);
        }
        // non-pooled buffers are simply dropped
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}
