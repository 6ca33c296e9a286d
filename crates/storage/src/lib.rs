//! SQLite-backed response cache for runprompt.
//!
//! Completed model responses are stored keyed by the backend that produced
//! them and the exact request that was sent, so re-running an unchanged
//! prompt with the same inputs never reaches the network.
//!
//! # Example
//!
//! ```no_run
//! use storage::{CacheKey, ResponseCache};
//!
//! let cache = ResponseCache::open_dir("/tmp/runprompt-cache")?;
//! let key = CacheKey::new("openai", &("gpt-4o", "Say hello"))?;
//!
//! if let Some(hit) = cache.get::<String>(&key)? {
//!     println!("cached at {}: {}", hit.created_at, hit.response);
//! } else {
//!     cache.put(&key, &"Hello!".to_string())?;
//! }
//!
//! println!("Cleared {} cached responses", cache.clear()?);
//! # Ok::<(), storage::Error>(())
//! ```

mod cache;
mod error;

pub use cache::{CACHE_FILE, CacheKey, CachedResponse, ResponseCache, clear_dir};
pub use error::{Error, Result};
