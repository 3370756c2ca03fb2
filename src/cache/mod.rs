//! Content cache module
//!
//! Bounded, path-keyed store of previously served file bodies with
//! least-recently-used eviction.
//!
//! ```text
//!   index: HashMap<String, SlotId>          nodes: Vec<Option<Node>>
//!
//!   head ──► [MRU] ◄──► [ .. ] ◄──► [LRU] ◄── tail
//!
//!   get(k):  hit  -> move k to head
//!   put(k):  new  -> evict tail when full, push k at head
//!            seen -> replace content, move k to head
//! ```
//!
//! Recency is bumped by both `get` and `put`. The cache never notices that a
//! file changed on disk; a stale body stays until it is evicted or expires.
//!
//! The cache is mutated through `&mut self` and holds no lock. Sharing it
//! between concurrent connection handlers needs one mutex around the whole
//! structure, since the index and the recency list must change together.

mod stats;

pub use stats::CacheStats;

use bytes::Bytes;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::logger;

type SlotId = usize;

/// A cached response body and its metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    key: String,
    content_type: String,
    content: Bytes,
    content_length: usize,
    stored_at: Instant,
}

impl CacheEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub const fn content(&self) -> &Bytes {
        &self.content
    }

    pub const fn content_length(&self) -> usize {
        self.content_length
    }

    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.saturating_duration_since(self.stored_at) >= ttl)
    }
}

#[derive(Debug)]
struct Node {
    entry: CacheEntry,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// LRU cache of file bodies keyed by resolved path
#[derive(Debug)]
pub struct ContentCache {
    capacity: usize,
    ttl: Option<Duration>,
    index: HashMap<String, SlotId>,
    nodes: Vec<Option<Node>>,
    free: Vec<SlotId>,
    /// Most recently used
    head: Option<SlotId>,
    /// Least recently used
    tail: Option<SlotId>,
    stats: CacheStats,
}

impl ContentCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// `ttl_secs` of 0 means entries never expire by time; only capacity
    /// driven eviction applies. A capacity of 0 yields a cache that stores
    /// nothing.
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        Self {
            capacity,
            ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            index: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            stats: CacheStats::default(),
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check for a key without touching recency or expiry
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Look up `key`, marking it most recently used on a hit.
    ///
    /// The returned view is valid until the next mutation of the cache.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<&CacheEntry> {
        let Some(&id) = self.index.get(key) else {
            self.stats.misses += 1;
            return None;
        };

        if self.node(id).entry.is_expired(self.ttl, now) {
            self.remove_slot(id);
            self.stats.expirations += 1;
            self.stats.misses += 1;
            logger::log_cache_event("expired", key);
            return None;
        }

        self.move_to_front(id);
        self.stats.hits += 1;
        self.validate_invariants();
        Some(&self.node(id).entry)
    }

    /// Insert or replace the entry for `key` and mark it most recently used.
    ///
    /// The first `content_length` bytes of `content` are copied; the caller's
    /// buffer is not retained. Inserting a new key into a full cache evicts
    /// the least recently used entry first.
    pub fn put(&mut self, key: &str, content_type: &str, content: &[u8], content_length: usize) {
        self.put_at(key, content_type, content, content_length, Instant::now());
    }

    fn put_at(
        &mut self,
        key: &str,
        content_type: &str,
        content: &[u8],
        content_length: usize,
        now: Instant,
    ) {
        if self.capacity == 0 {
            return;
        }

        let len = content_length.min(content.len());
        let body = Bytes::copy_from_slice(&content[..len]);

        if let Some(&id) = self.index.get(key) {
            let entry = &mut self.node_mut(id).entry;
            let old_len = entry.content_length;
            entry.content_type = content_type.to_string();
            entry.content = body;
            entry.content_length = len;
            entry.stored_at = now;
            self.stats.resident_bytes = self.stats.resident_bytes - old_len + len;
            self.move_to_front(id);
            self.validate_invariants();
            return;
        }

        if self.index.len() >= self.capacity {
            if let Some(lru) = self.tail {
                let evicted = self.remove_slot(lru);
                self.stats.evictions += 1;
                logger::log_cache_event("evicted", &evicted.key);
            }
        }

        let node = Node {
            entry: CacheEntry {
                key: key.to_string(),
                content_type: content_type.to_string(),
                content: body,
                content_length: len,
                stored_at: now,
            },
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key.to_string(), id);
        self.attach_front(id);
        self.stats.resident_bytes += len;
        self.validate_invariants();
    }

    /// Keys ordered from least to most recently used
    pub fn keys_by_recency(&self) -> Vec<&str> {
        let mut keys = Vec::with_capacity(self.len());
        let mut current = self.tail;
        while let Some(id) = current {
            let node = self.node(id);
            keys.push(node.entry.key.as_str());
            current = node.prev;
        }
        keys
    }

    fn node(&self, id: SlotId) -> &Node {
        self.nodes[id]
            .as_ref()
            .unwrap_or_else(|| unreachable!("slot {id} is linked but empty"))
    }

    fn node_mut(&mut self, id: SlotId) -> &mut Node {
        self.nodes[id]
            .as_mut()
            .unwrap_or_else(|| unreachable!("slot {id} is linked but empty"))
    }

    /// Unlink a slot from the list, free it, and drop its index entry
    fn remove_slot(&mut self, id: SlotId) -> CacheEntry {
        self.detach(id);
        let node = self.nodes[id]
            .take()
            .unwrap_or_else(|| unreachable!("slot {id} is linked but empty"));
        self.free.push(id);
        self.index.remove(&node.entry.key);
        self.stats.resident_bytes -= node.entry.content_length;
        node.entry
    }

    fn move_to_front(&mut self, id: SlotId) {
        if self.head == Some(id) {
            return;
        }
        self.detach(id);
        self.attach_front(id);
    }

    /// Detach a node from the linked list without removing it from the index
    fn detach(&mut self, id: SlotId) {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(id);
        node.prev = None;
        node.next = None;
    }

    /// Attach a node at the MRU position
    fn attach_front(&mut self, id: SlotId) {
        let old_head = self.head;
        {
            let node = self.node_mut(id);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    /// Validate internal invariants (debug builds only)
    fn validate_invariants(&self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.index.len() <= self.capacity);

            let mut count = 0usize;
            let mut current = self.head;
            let mut prev = None;
            while let Some(id) = current {
                count += 1;
                assert!(count <= self.index.len(), "cycle detected in recency list");
                let node = self.node(id);
                debug_assert_eq!(node.prev, prev);
                debug_assert_eq!(self.index.get(&node.entry.key), Some(&id));
                prev = current;
                current = node.next;
            }
            debug_assert_eq!(prev, self.tail);
            debug_assert_eq!(count, self.index.len());
        }
    }
}
