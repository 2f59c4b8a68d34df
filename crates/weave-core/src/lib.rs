//! # Weave Core
//!
//! State container primitives that the Weave plugin runtime is layered on.
//!
//! This crate provides the unidirectional data-flow building blocks:
//! - Reducers (pure `(state, action) -> state` functions)
//! - Middleware (action interception with an explicit `Next` continuation)
//! - Composition of reducers and middleware chains
//! - A minimal [`Store`] with synchronous dispatch and lock-free state reads
//!
//! Everything is generic over the state type `S`, the action type `A` and the
//! value `R` that `dispatch` hands back to its caller.
//!
//! ## Example
//!
//! ```rust
//! use weave_core::{middleware_fn, reducer_fn, Store};
//!
//! #[derive(Debug, Clone)]
//! struct Incr(i64);
//!
//! // `dispatch` hands the action back once it has been reduced
//! let store = Store::<i64, Incr, Incr>::builder(reducer_fn(|n: i64, a: &Incr| n + a.0), 0)
//!     .with_middleware(middleware_fn(|_store, action, next| next.run(action)))
//!     .build();
//!
//! store.dispatch(Incr(2));
//! assert_eq!(*store.state(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod middleware;
pub mod reducer;
pub mod store;

pub use middleware::{compose_middleware, middleware_fn, ComposedMiddleware, Middleware, Next};
pub use reducer::{compose_reducers, reducer_fn, ActionKind, ComposedReducer, Reducer, ReducerMap};
pub use store::{Store, StoreBuilder};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::middleware::{compose_middleware, middleware_fn, Middleware, Next};
    pub use crate::reducer::{compose_reducers, reducer_fn, ActionKind, Reducer, ReducerMap};
    pub use crate::store::{Store, StoreBuilder};
}
