//! Command handler for cache scripts

use std::fmt;
use std::sync::Arc;

use lrucache::SharedLruCache;
use tracing::debug;

use crate::command::Command;

/// Result of one command, rendered as a single output line
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Command succeeded with nothing to report
    Ok,
    /// Key not found
    Nil,
    /// Cached value
    Value(String),
    /// Count or boolean
    Integer(usize),
    /// Key listing
    List(Vec<String>),
    /// Free-form report
    Text(String),
    /// Malformed command
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Value(value) => write!(f, "{}", value),
            Reply::Integer(n) => write!(f, "{}", n),
            Reply::List(items) if items.is_empty() => write!(f, "(empty)"),
            Reply::List(items) => write!(f, "{}", items.join(" ")),
            Reply::Text(text) => write!(f, "{}", text),
            Reply::Error(msg) => write!(f, "ERR {}", msg),
        }
    }
}

/// Executes parsed commands against a shared cache
pub struct CommandHandler {
    cache: Arc<SharedLruCache<String, String>>,
}

impl CommandHandler {
    pub fn new(cache: Arc<SharedLruCache<String, String>>) -> Self {
        Self { cache }
    }

    pub fn handle(&self, cmd: Command) -> Reply {
        debug!(?cmd, "handling command");
        match cmd {
            Command::Set { key, value } => {
                self.cache.set(key, value);
                Reply::Ok
            }
            Command::Get(key) => self.cache.get(&key).map_or(Reply::Nil, Reply::Value),
            Command::Peek(key) => self.cache.peek(&key).map_or(Reply::Nil, Reply::Value),
            Command::Del(key) => Reply::Integer(usize::from(self.cache.remove(&key).is_some())),
            Command::Exists(key) => Reply::Integer(usize::from(self.cache.contains(&key))),
            Command::Len => Reply::Integer(self.cache.len()),
            Command::Keys => Reply::List(self.cache.keys()),
            Command::Clear => {
                self.cache.clear();
                Reply::Ok
            }
            Command::Stats => self.handle_stats(),
        }
    }

    fn handle_stats(&self) -> Reply {
        let stats = self.cache.stats();
        Reply::Text(format!(
            "len={} capacity={} hits={} misses={} hit_ratio={:.2} inserts={} updates={} evictions={} removals={}",
            self.cache.len(),
            self.cache.capacity(),
            stats.hits(),
            stats.misses(),
            stats.hit_ratio(),
            stats.inserts(),
            stats.updates(),
            stats.evictions(),
            stats.removals(),
        ))
    }
}
