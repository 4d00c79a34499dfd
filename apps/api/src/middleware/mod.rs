//! HTTP caching middlewares.
//!
//! [`response_cache::cache_get_responses`] memoizes successful GET bodies and
//! [`invalidation::invalidate_on_success`] evicts them after a successful
//! mutation. Both are attached per route with `from_fn_with_state`.

pub mod invalidation;
pub mod response_cache;

pub use invalidation::{invalidate_on_success, InvalidationPolicy};
pub use response_cache::{cache_get_responses, ResponseCachePolicy, X_CACHE};
