//! Identity-keyed memoization.
//!
//! A memo node remembers the inputs of its last evaluation and the output it
//! produced. When asked again with inputs that are *the same objects* (pointer
//! equality for shared state, value equality for plain ids) it hands back the
//! cached output without running the computation.
//!
//! # Contract
//! Inputs must follow copy-on-write: any change in content must come with a new
//! `Arc`. Mutating shared state in place is a programming error and makes the
//! cache serve stale results. Two deeply equal but distinct `Arc`s are treated as
//! different inputs and trigger a recomputation.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Cheap "is this the same input" check used by memo nodes.
pub trait Identity {
    fn same_as(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Arc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

macro_rules! value_identity {
    ($($ty:ty),*) => {
        $(
            impl Identity for $ty {
                fn same_as(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

value_identity!(bool, u32, u64, usize);

macro_rules! tuple_identity {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Identity),+> Identity for ($($name,)+) {
            fn same_as(&self, other: &Self) -> bool {
                $(self.$idx.same_as(&other.$idx))&&+
            }
        }
    };
}

tuple_identity!(A 0, B 1);
tuple_identity!(A 0, B 1, C 2);
tuple_identity!(A 0, B 1, C 2, D 3);
tuple_identity!(A 0, B 1, C 2, D 3, E 4);

/// Hit/miss counters of a memo node.
#[derive(Debug, Default)]
struct MemoStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoStats {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MemoCounts {
        MemoCounts {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a node's counters. `misses` is the number of times the
/// computation actually ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoCounts {
    pub hits: u64,
    pub misses: u64,
}

impl std::ops::Add for MemoCounts {
    type Output = MemoCounts;

    fn add(self, rhs: Self) -> Self::Output {
        MemoCounts {
            hits: self.hits + rhs.hits,
            misses: self.misses + rhs.misses,
        }
    }
}

struct CellEntry<I, O> {
    inputs: I,
    output: Arc<O>,
}

/// A single memoized computation node.
pub struct MemoCell<I, O> {
    name: &'static str,
    slot: Mutex<Option<CellEntry<I, O>>>,
    stats: MemoStats,
}

impl<I: Identity, O> MemoCell<I, O> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
            stats: MemoStats::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached output if `inputs` are the same as last time, otherwise run
    /// `compute` and cache its result.
    ///
    /// `compute` runs without holding the lock; the entry is replaced as a whole.
    pub fn get_or_compute<F>(&self, inputs: I, compute: F) -> Arc<O>
    where
        F: FnOnce(&I) -> O,
    {
        if let Some(entry) = self.slot.lock().as_ref() {
            if entry.inputs.same_as(&inputs) {
                self.stats.hit();
                return Arc::clone(&entry.output);
            }
        }

        self.stats.miss();
        trace!(node = self.name, "recomputing");
        let output = Arc::new(compute(&inputs));
        *self.slot.lock() = Some(CellEntry {
            inputs,
            output: Arc::clone(&output),
        });
        output
    }

    pub fn counts(&self) -> MemoCounts {
        self.stats.snapshot()
    }

    /// Drop the cached entry; the next call recomputes.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

struct TableEntry<I, O> {
    inputs: I,
    output: Arc<O>,
    last_used: u64,
}

struct TableState<K, I, O> {
    entries: HashMap<K, TableEntry<I, O>>,
    tick: u64,
}

/// A family of memo nodes sharing one computation, one node per key.
///
/// Keys never invalidate each other. With a capacity set, the least recently used
/// key is evicted once the table is full.
pub struct MemoTable<K, I, O> {
    name: &'static str,
    state: Mutex<TableState<K, I, O>>,
    capacity: Option<usize>,
    stats: MemoStats,
}

impl<K, I, O> MemoTable<K, I, O>
where
    K: Eq + Hash + Clone,
    I: Identity,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutex::new(TableState {
                entries: HashMap::new(),
                tick: 0,
            }),
            capacity: None,
            stats: MemoStats::default(),
        }
    }

    pub fn with_capacity(name: &'static str, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new(name)
        }
    }

    pub fn compute<F>(&self, key: &K, inputs: I, compute: F) -> Arc<O>
    where
        F: FnOnce(&I) -> O,
    {
        {
            let mut state = self.state.lock();
            state.tick += 1;
            let tick = state.tick;
            if let Some(entry) = state.entries.get_mut(key) {
                if entry.inputs.same_as(&inputs) {
                    entry.last_used = tick;
                    self.stats.hit();
                    return Arc::clone(&entry.output);
                }
            }
        }

        self.stats.miss();
        trace!(table = self.name, "recomputing");
        let output = Arc::new(compute(&inputs));

        let mut state = self.state.lock();
        let tick = state.tick;
        state.entries.insert(
            key.clone(),
            TableEntry {
                inputs,
                output: Arc::clone(&output),
                last_used: tick,
            },
        );
        if let Some(capacity) = self.capacity {
            while state.entries.len() > capacity {
                let oldest = state
                    .entries
                    .iter()
                    .filter(|(k, _)| *k != key)
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(oldest) => {
                        state.entries.remove(&oldest);
                        debug!(table = self.name, capacity, "evicted least recently used entry");
                    }
                    None => break,
                }
            }
        }
        output
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> MemoCounts {
        self.stats.snapshot()
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }
}
