//! A module for the fixed pool of line buffers rotated between the reader
//! and the analyzer threads.
//!
//! The pool owns `N` buffer slots (`N` = analyzer count). Slot indices
//! circulate through two FIFO queues: *empty* indices wait for the reader,
//! *full* indices wait for an analyzer. A slot index is in at most one
//! queue at a time; while the reader is filling a buffer, or an analyzer is
//! draining one, its index is checked out and belongs to that thread alone.
//! All waiting goes through condition variables.
//!
//! Termination is published through the full-queue mutex: waking on the
//! full-queue condvar only guarantees visibility of writes released under
//! that same lock, so `reader_done` and `decode_error` live inside it.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use log::trace;

/// Decoded lines per buffer. The small debug value forces queue rotation
/// even on tiny test inputs.
pub const LINES_PER_BUFFER: usize = if cfg!(debug_assertions) { 10 } else { 1000 };

/// A reusable batch of decoded lines.
#[derive(Debug)]
pub struct ParserBuffer {
    lines: Vec<String>,
}

impl ParserBuffer {
    fn new() -> Self {
        ParserBuffer {
            lines: Vec::with_capacity(LINES_PER_BUFFER),
        }
    }

    pub fn add_line(&mut self, line: String) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Empties the buffer, keeping its allocation for the next fill.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[derive(Debug)]
struct FullQueue {
    indices: VecDeque<usize>,
    reader_done: bool,
    decode_error: bool,
}

/// The fixed set of buffer slots plus the empty/full index queues.
#[derive(Debug)]
pub struct BufferPool {
    slots: Vec<Mutex<ParserBuffer>>,
    empty: Mutex<VecDeque<usize>>,
    empty_ready: Condvar,
    full: Mutex<FullQueue>,
    full_ready: Condvar,
}

impl BufferPool {
    /// Creates a pool of `num_slots` buffers. Slot 0 starts checked out as
    /// the reader's first fill target; the rest seed the empty queue.
    pub fn new(num_slots: usize) -> Self {
        assert!(num_slots >= 1, "the pool needs at least one buffer");
        BufferPool {
            slots: (0..num_slots).map(|_| Mutex::new(ParserBuffer::new())).collect(),
            empty: Mutex::new((1..num_slots).collect()),
            empty_ready: Condvar::new(),
            full: Mutex::new(FullQueue {
                indices: VecDeque::new(),
                reader_done: false,
                decode_error: false,
            }),
            full_ready: Condvar::new(),
        }
    }

    /// The slot pre-reserved for the reader's first fill.
    pub fn reader_slot(&self) -> usize {
        0
    }

    /// Locks a buffer by index. Callers only touch indices they have
    /// checked out, so this lock is never contended.
    pub fn buffer(&self, index: usize) -> MutexGuard<'_, ParserBuffer> {
        self.slots[index].lock().unwrap()
    }

    /// Reader side: blocks until an empty slot index is available.
    pub fn acquire_empty(&self) -> usize {
        let mut empty = self.empty.lock().unwrap();
        loop {
            if let Some(index) = empty.pop_front() {
                return index;
            }
            empty = self.empty_ready.wait(empty).unwrap();
        }
    }

    /// Analyzer side: hands a drained slot back and wakes the reader.
    pub fn release_empty(&self, index: usize) {
        debug_assert!(self.buffer(index).is_empty(), "released buffer still holds lines");
        let mut empty = self.empty.lock().unwrap();
        empty.push_back(index);
        self.empty_ready.notify_one();
    }

    /// Reader side: publishes a filled slot and wakes one analyzer.
    pub fn publish_full(&self, index: usize) {
        trace!("publishing buffer {}", index);
        let mut full = self.full.lock().unwrap();
        full.indices.push_back(index);
        self.full_ready.notify_one();
    }

    /// Analyzer side: blocks for the next full slot. Returns `None` when
    /// the run is over: either the reader is done and every published
    /// buffer has been taken, or decoding failed and the remaining buffers
    /// must not be processed.
    pub fn next_full(&self) -> Option<usize> {
        let mut full = self.full.lock().unwrap();
        loop {
            if full.decode_error {
                return None;
            }
            if let Some(index) = full.indices.pop_front() {
                return Some(index);
            }
            if full.reader_done {
                return None;
            }
            full = self.full_ready.wait(full).unwrap();
        }
    }

    /// Reader side: normal end of input. Wakes every analyzer so they can
    /// drain the queue and exit.
    pub fn finish(&self) {
        let mut full = self.full.lock().unwrap();
        full.reader_done = true;
        self.full_ready.notify_all();
    }

    /// Reader side: decoding failed. Analyzers stop immediately, even with
    /// buffers still queued.
    pub fn abort(&self) {
        let mut full = self.full.lock().unwrap();
        full.decode_error = true;
        full.reader_done = true;
        self.full_ready.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::thread;

    #[test]
    fn slots_start_split_between_reader_and_empty_queue() {
        let pool = BufferPool::new(4);
        assert_eq!(pool.reader_slot(), 0);
        // Slots 1..4 are immediately available without blocking.
        assert_eq!(pool.acquire_empty(), 1);
        assert_eq!(pool.acquire_empty(), 2);
        assert_eq!(pool.acquire_empty(), 3);
    }

    #[test]
    fn full_queue_is_fifo() {
        let pool = BufferPool::new(3);
        pool.buffer(0).add_line("a".to_string());
        pool.buffer(1).add_line("b".to_string());
        pool.publish_full(0);
        pool.publish_full(1);
        pool.finish();
        assert_eq!(pool.next_full(), Some(0));
        assert_eq!(pool.next_full(), Some(1));
        assert_eq!(pool.next_full(), None);
    }

    #[test]
    fn finish_wakes_waiting_consumers() {
        let pool = BufferPool::new(2);
        thread::scope(|scope| {
            let waiter = scope.spawn(|_| pool.next_full());
            pool.finish();
            assert_eq!(waiter.join().unwrap(), None);
        })
        .unwrap();
    }

    #[test]
    fn abort_discards_published_buffers() {
        let pool = BufferPool::new(2);
        pool.buffer(0).add_line("a".to_string());
        pool.publish_full(0);
        pool.abort();
        assert_eq!(pool.next_full(), None);
    }

    #[test]
    fn single_slot_pool_rotates() {
        let pool = BufferPool::new(1);
        thread::scope(|scope| {
            let consumer = scope.spawn(|_| {
                let mut drained = 0;
                while let Some(index) = pool.next_full() {
                    pool.buffer(index).clear();
                    pool.release_empty(index);
                    drained += 1;
                }
                drained
            });

            let mut fill = pool.reader_slot();
            for round in 0..5 {
                pool.buffer(fill).add_line(format!("line {}", round));
                pool.publish_full(fill);
                fill = pool.acquire_empty();
            }
            pool.finish();
            assert_eq!(consumer.join().unwrap(), 5);
        })
        .unwrap();
    }
}
