use crossbeam_channel::{Receiver, Sender, bounded};
use std::ops::{Deref, DerefMut};

/// Initial capacity of a freshly allocated render buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Buffers that grew past this are dropped instead of returned, so one huge
/// line does not pin its allocation for the life of the process.
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

/// Reusable render buffers.
///
/// The free list is a bounded channel: `acquire` pops an idle buffer or
/// allocates one, and the returned guard pushes it back on drop. When the
/// free list is full the buffer is simply dropped. Nothing blocks.
pub struct BufferPool {
    sender: Sender<Vec<u8>>,
    receiver: Receiver<Vec<u8>>,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Pool keeping at most `max_idle` buffers around.
    pub fn new(max_idle: usize) -> Self {
        let (sender, receiver) = bounded(max_idle);
        Self {
            sender,
            receiver,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Borrow an empty buffer. It goes back to the pool when the guard drops.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buf = self
            .receiver
            .try_recv()
            .unwrap_or_else(|_| Vec::with_capacity(self.buffer_capacity));
        buf.clear();
        PooledBuffer { buf, pool: self }
    }

    /// Number of idle buffers waiting for reuse.
    pub fn idle(&self) -> usize {
        self.receiver.len()
    }

    fn release(&self, buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        // Full free list: let the buffer go.
        let _ = self.sender.try_send(buf);
    }
}

/// A buffer on loan from a [`BufferPool`].
pub struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
