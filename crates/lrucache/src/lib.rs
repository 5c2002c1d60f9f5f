//! # lrucache
//!
//! Fixed-capacity LRU cache with O(1) `get` and `set`.
//!
//! ## Architecture
//! - **HashMap**: AHash index from key to list handle (O(1))
//! - **Recency list**: `seqlist` doubly-linked list, head = least recent (O(1))
//! - **SharedLruCache**: one mutex around the whole cache, plus statistics
//!
//! ## Example
//! ```
//! use lrucache::LruCache;
//!
//! let mut cache = LruCache::new(2).unwrap();
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.get("a");
//! cache.set("c", 3);
//!
//! assert_eq!(cache.get("b"), None);
//! assert_eq!(cache.get("a"), Some(&1));
//! ```

#![warn(missing_docs)]

mod error;
mod lru;
mod shared;
mod stats;

pub use error::{Error, Result};
pub use lru::LruCache;
pub use shared::SharedLruCache;
pub use stats::CacheStats;
