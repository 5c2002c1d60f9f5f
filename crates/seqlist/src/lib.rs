//! # seqlist
//!
//! Doubly-linked list with direct node access, used as the recency order
//! of `lrucache`.
//!
//! ## Architecture
//! - **Slot arena**: nodes live in one `Vec`, links are slot indices
//! - **Handles**: slot index + generation, so stale handles are detected
//! - **Operations**: insert at either end, remove, move to either end, all O(1)
//!
//! ## Example
//! ```
//! use seqlist::DoublyLinkedList;
//!
//! let mut list = DoublyLinkedList::new();
//! let a = list.insert_at_tail("a");
//! list.insert_at_tail("b");
//! list.move_to_tail(a).unwrap();
//!
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec!["b", "a"]);
//! ```

#![warn(missing_docs)]

mod error;
mod list;

pub use error::{Error, Result};
pub use list::{DoublyLinkedList, Handle, Iter};
