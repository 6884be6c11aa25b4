//! Least-recently-used store with metadata and approximate lookup.
//!
//! [`LruCache`] keeps its entries in a doubly linked list ordered by recency (head is
//! the most recently added or read entry, tail the least) and indexes them by key for
//! exact lookups. Every entry also carries a metadata value, which [`LruCache::find`]
//! can match against. That is what allows a request for a small genomic region to be
//! answered from a cached entry whose metadata describes a larger, covering region,
//! even though the two keys differ.
//!
//! The list lives in a `Vec` of slots linked by index, with freed slots recycled, so
//! no node is ever reachable through more than one owner.
//!
//! # Capacity
//!
//! - `max_size` is the hard upper bound on [`LruCache::len`]; inserting into a full
//!   cache evicts the tail before the new entry is linked in.
//! - `max_size == 0` turns the cache into a no-op store: [`LruCache::add`] discards
//!   everything.
//! - Negative capacities are rejected by [`LruCache::try_new`]; there is no
//!   "unbounded" sentinel.
//!
//! # Examples
//!
//! ```rust
//! use undercomplicate::cache::LruCache;
//!
//! let mut cache: LruCache<&str, u32> = LruCache::new(3);
//! for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
//!     cache.add(key, i as u32, ());
//! }
//!
//! assert!(!cache.has(&"a"));
//! assert!(!cache.has(&"b"));
//! assert_eq!(cache.head().map(|n| n.key), Some("e"));
//! assert_eq!(cache.tail().map(|n| n.key), Some("c"));
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::constants::DEFAULT_CACHE_SIZE;
use crate::core::{PipelineError, Result};

/// One cache entry: key, value, and the metadata stored alongside it.
#[derive(Debug)]
pub struct Node<K, V, M> {
    /// Exact lookup key
    pub key: K,
    /// Cached value
    pub value: V,
    /// Caller-supplied metadata, used for approximate matching
    pub metadata: M,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A bounded least-recently-used cache.
///
/// `M` is the per-entry metadata type; use `()` when no metadata is needed.
#[derive(Debug)]
pub struct LruCache<K, V, M = ()> {
    max_size: usize,
    store: HashMap<K, usize>,
    nodes: Vec<Option<Node<K, V, M>>>,
    free_slots: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    cur_size: usize,
}

impl<K, V, M> LruCache<K, V, M>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache holding at most `max_size` entries.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            store: HashMap::new(),
            nodes: Vec::new(),
            free_slots: Vec::new(),
            head: None,
            tail: None,
            cur_size: 0,
        }
    }

    /// Creates a cache from a signed size, as read from loosely typed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if `max_size` is negative.
    pub fn try_new(max_size: i64) -> Result<Self> {
        let max_size = usize::try_from(max_size).map_err(|_| {
            PipelineError::config(format!(
                "Cache \"max_size\" must be >= 0, but {max_size} was given"
            ))
        })?;
        Ok(Self::new(max_size))
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.cur_size
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.cur_size == 0
    }

    /// Exact membership test. Does not change recency order.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.contains_key(key)
    }

    /// Returns the value stored under `key` and promotes the entry to most recently
    /// used. A miss leaves the order untouched.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.store.get(key)?;
        self.unlink(idx);
        self.link_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Returns the value stored under `key` without promoting the entry.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.store.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Metadata stored under `key`, without promoting the entry.
    pub fn metadata<Q>(&self, key: &Q) -> Option<&M>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.store.get(key)?;
        self.nodes[idx].as_ref().map(|node| &node.metadata)
    }

    /// Inserts or replaces an entry at the head of the list.
    ///
    /// An existing entry with the same key is removed first so it never counts twice.
    /// When the cache is full the least recently used entry is evicted before the new
    /// one is linked in, so the size never exceeds `max_size`.
    pub fn add(&mut self, key: K, value: V, metadata: M) {
        if self.max_size == 0 {
            return;
        }

        self.remove(&key);
        if self.cur_size >= self.max_size
            && let Some(tail) = self.tail
        {
            self.release(tail);
        }

        let node = Node {
            key: key.clone(),
            value,
            metadata,
            prev: None,
            next: None,
        };
        let idx = match self.free_slots.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.link_front(idx);
        self.store.insert(key, idx);
        self.cur_size += 1;
    }

    /// Removes the entry stored under `key`. Returns whether one was found.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.store.get(key) {
            Some(&idx) => {
                self.release(idx);
                true
            }
            None => false,
        }
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.store.clear();
        self.nodes.clear();
        self.free_slots.clear();
        self.head = None;
        self.tail = None;
        self.cur_size = 0;
    }

    /// Scans from most to least recently used and returns the first node accepted by
    /// `predicate`. Recency order is not changed.
    pub fn find<P>(&self, mut predicate: P) -> Option<&Node<K, V, M>>
    where
        P: FnMut(&Node<K, V, M>) -> bool,
    {
        self.iter().find(|node| predicate(node))
    }

    /// Most recently used entry.
    pub fn head(&self) -> Option<&Node<K, V, M>> {
        self.head.and_then(|idx| self.nodes[idx].as_ref())
    }

    /// Least recently used entry, the next one to be evicted.
    pub fn tail(&self) -> Option<&Node<K, V, M>> {
        self.tail.and_then(|idx| self.nodes[idx].as_ref())
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V, M> {
        Iter {
            nodes: &self.nodes,
            cursor: self.head,
        }
    }

    /// Unlinks, frees and unindexes the node at `idx`.
    fn release(&mut self, idx: usize) {
        self.unlink(idx);
        if let Some(node) = self.nodes[idx].take() {
            self.store.remove(&node.key);
            self.free_slots.push(idx);
            self.cur_size -= 1;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.nodes[idx].as_mut() {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.nodes[p].as_mut() {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.nodes[n].as_mut() {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.nodes[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head
            && let Some(node) = self.nodes[h].as_mut()
        {
            node.prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}

impl<K, V, M> Default for LruCache<K, V, M>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Iterator over cache nodes, most recently used first.
pub struct Iter<'a, K, V, M> {
    nodes: &'a [Option<Node<K, V, M>>],
    cursor: Option<usize>,
}

impl<'a, K, V, M> Iterator for Iter<'a, K, V, M> {
    type Item = &'a Node<K, V, M>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes[self.cursor?].as_ref()?;
        self.cursor = node.next;
        Some(node)
    }
}
