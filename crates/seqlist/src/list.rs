//! Doubly-linked list stored in a slot arena
//!
//! Nodes live in a `Vec` of slots and link to each other by slot index, so
//! relinking never allocates and handles stay valid across moves.
//!
//! ```text
//!   slots
//!   ┌─────┬─────┬──────────────────────────────────────┐
//!   │ idx │ gen │ node                                 │
//!   ├─────┼─────┼──────────────────────────────────────┤
//!   │ 0   │ 0   │ { payload: A, prev: None, next: 2 }  │
//!   │ 1   │ 1   │ (free)                               │
//!   │ 2   │ 0   │ { payload: B, prev: 0, next: None }  │
//!   └─────┴─────┴──────────────────────────────────────┘
//!
//!   head ─► [0] ◄──► [2] ◄── tail
//! ```
//!
//! Removing a node bumps its slot's generation, which is how stale handles
//! are told apart from the node that later reuses the slot. Handles also
//! carry the id of the list that issued them.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Opaque, non-owning reference to a node in a [`DoublyLinkedList`]
///
/// A handle stays valid while its node is in the list, including across
/// `move_to_head` / `move_to_tail`. Once the node is removed every operation
/// taking the handle fails with [`Error::InvalidHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    list: u64,
    index: usize,
    generation: u64,
}

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(0);

struct Node<T> {
    payload: T,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Slot<T> {
    generation: u64,
    node: Option<Node<T>>,
}

/// Doubly-linked list with O(1) insert, remove and relocation by handle
///
/// Head is the front of the list, tail is the back.
pub struct DoublyLinkedList<T> {
    id: u64,
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> DoublyLinkedList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Create a list seeded with a single node
    pub fn with_head(payload: T) -> (Self, Handle) {
        let mut list = Self::new();
        let handle = list.insert_at_head(payload);
        (list, handle)
    }

    /// Number of nodes in the list
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check whether `handle` refers to a live node of this list
    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Handle of the head node
    pub fn head_handle(&self) -> Option<Handle> {
        self.head.map(|idx| self.handle_at(idx))
    }

    /// Handle of the tail node
    pub fn tail_handle(&self) -> Option<Handle> {
        self.tail.map(|idx| self.handle_at(idx))
    }

    /// Insert a payload before the current head
    pub fn insert_at_head(&mut self, payload: T) -> Handle {
        let idx = self.alloc(payload);
        self.link_front(idx);
        self.len += 1;
        self.handle_at(idx)
    }

    /// Insert a payload after the current tail
    pub fn insert_at_tail(&mut self, payload: T) -> Handle {
        let idx = self.alloc(payload);
        self.link_back(idx);
        self.len += 1;
        self.handle_at(idx)
    }

    /// Unlink the node behind `handle` and return its payload
    pub fn remove(&mut self, handle: Handle) -> Result<T> {
        let idx = self.resolve(handle)?;
        self.take(idx).ok_or(Error::InvalidHandle)
    }

    /// Remove the head node and return its payload
    pub fn pop_head(&mut self) -> Result<T> {
        let idx = self.head.ok_or(Error::EmptySequence)?;
        self.take(idx).ok_or(Error::EmptySequence)
    }

    /// Remove the tail node and return its payload
    pub fn pop_tail(&mut self) -> Result<T> {
        let idx = self.tail.ok_or(Error::EmptySequence)?;
        self.take(idx).ok_or(Error::EmptySequence)
    }

    /// Relink the node behind `handle` as the new head
    ///
    /// Does nothing if the node already is the head, which includes every
    /// single-node list.
    pub fn move_to_head(&mut self, handle: Handle) -> Result<()> {
        let idx = self.resolve(handle)?;
        if self.head == Some(idx) {
            return Ok(());
        }

        self.unlink(idx);
        self.link_front(idx);
        Ok(())
    }

    /// Relink the node behind `handle` as the new tail
    ///
    /// Does nothing if the node already is the tail.
    pub fn move_to_tail(&mut self, handle: Handle) -> Result<()> {
        let idx = self.resolve(handle)?;
        if self.tail == Some(idx) {
            return Ok(());
        }

        self.unlink(idx);
        self.link_back(idx);
        Ok(())
    }

    /// Payload at the head
    pub fn peek_head(&self) -> Result<&T> {
        self.head
            .and_then(|idx| self.node(idx))
            .map(|node| &node.payload)
            .ok_or(Error::EmptySequence)
    }

    /// Payload at the tail
    pub fn peek_tail(&self) -> Result<&T> {
        self.tail
            .and_then(|idx| self.node(idx))
            .map(|node| &node.payload)
            .ok_or(Error::EmptySequence)
    }

    /// Payload of the node behind `handle`
    pub fn get(&self, handle: Handle) -> Result<&T> {
        let idx = self.resolve(handle)?;
        self.node(idx)
            .map(|node| &node.payload)
            .ok_or(Error::InvalidHandle)
    }

    /// Mutable payload of the node behind `handle`
    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T> {
        let idx = self.resolve(handle)?;
        self.node_mut(idx)
            .map(|node| &mut node.payload)
            .ok_or(Error::InvalidHandle)
    }

    /// Remove every node; all outstanding handles become invalid
    pub fn clear(&mut self) {
        self.free_list.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_list.push(idx);
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate payloads from head to tail
    ///
    /// The iterator borrows the list, so no structural mutation can happen
    /// while it is alive.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Largest payload in the list (linear scan)
    pub fn max(&self) -> Option<&T>
    where
        T: Ord,
    {
        self.iter().max()
    }

    /// Panic if the links disagree with `head`, `tail` or `len`
    ///
    /// O(n); meant for tests and debug assertions.
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.head.is_none(), self.len == 0, "head/len mismatch");
        assert_eq!(self.tail.is_none(), self.len == 0, "tail/len mismatch");

        let occupied = self.slots.iter().filter(|slot| slot.node.is_some()).count();
        assert_eq!(occupied, self.len, "occupied slots != len");

        if let Some(head) = self.head.and_then(|idx| self.node(idx)) {
            assert!(head.prev.is_none(), "head has a prev link");
        }
        if let Some(tail) = self.tail.and_then(|idx| self.node(idx)) {
            assert!(tail.next.is_none(), "tail has a next link");
        }

        let mut steps = 0;
        let mut prev = None;
        let mut current = self.head;
        while let Some(idx) = current {
            let node = match self.node(idx) {
                Some(node) => node,
                None => panic!("link to free slot {}", idx),
            };
            assert_eq!(node.prev, prev, "broken prev link at slot {}", idx);
            steps += 1;
            assert!(steps <= self.len, "cycle detected");
            prev = Some(idx);
            current = node.next;
        }
        assert_eq!(steps, self.len, "walk length != len");
        assert_eq!(prev, self.tail, "walk did not end at tail");
    }

    fn handle_at(&self, idx: usize) -> Handle {
        Handle {
            list: self.id,
            index: idx,
            generation: self.slots[idx].generation,
        }
    }

    fn resolve(&self, handle: Handle) -> Result<usize> {
        if handle.list != self.id {
            return Err(Error::InvalidHandle);
        }
        match self.slots.get(handle.index) {
            Some(slot) if slot.generation == handle.generation && slot.node.is_some() => {
                Ok(handle.index)
            }
            _ => Err(Error::InvalidHandle),
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.slots.get(idx).and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.slots.get_mut(idx).and_then(|slot| slot.node.as_mut())
    }

    fn alloc(&mut self, payload: T) -> usize {
        let node = Node {
            payload,
            prev: None,
            next: None,
        };

        if let Some(idx) = self.free_list.pop() {
            self.slots[idx].node = Some(node);
            idx
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            self.slots.len() - 1
        }
    }

    /// Unlink and free a live slot
    fn take(&mut self, idx: usize) -> Option<T> {
        self.unlink(idx);
        let slot = self.slots.get_mut(idx)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(idx);
        self.len -= 1;
        Some(node.payload)
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = old_head;
        }

        match old_head {
            Some(head_idx) => {
                if let Some(head) = self.node_mut(head_idx) {
                    head.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }

        self.head = Some(idx);
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        if let Some(node) = self.node_mut(idx) {
            node.prev = old_tail;
            node.next = None;
        }

        match old_tail {
            Some(tail_idx) => {
                if let Some(tail) = self.node_mut(tail_idx) {
                    tail.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }

        self.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.node_mut(idx) {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = self.node_mut(prev_idx) {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = self.node_mut(next_idx) {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}

impl<T> Default for DoublyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for DoublyLinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for DoublyLinkedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for DoublyLinkedList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for payload in iter {
            self.insert_at_tail(payload);
        }
    }
}

impl<'a, T> IntoIterator for &'a DoublyLinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Head-to-tail iterator over list payloads
pub struct Iter<'a, T> {
    list: &'a DoublyLinkedList<T>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.front?)?;
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.payload)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.back?)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.payload)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}
