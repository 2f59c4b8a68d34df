//! Middleware trait and utilities

use crate::store::Store;
use std::fmt;
use std::sync::Arc;

/// Middleware trait for action interception
///
/// Middleware sees every dispatched action before it reaches the reducer. It
/// can transform the action, swallow it, dispatch further actions through
/// `store`, or hand back a different dispatch result.
pub trait Middleware<S, A, R>: Send + Sync {
    /// Process an action
    ///
    /// # Arguments
    ///
    /// * `store` - The store the action was dispatched on
    /// * `action` - The dispatched action
    /// * `next` - The rest of the chain, ending in the reducer
    ///
    /// # Returns
    ///
    /// The value `dispatch` hands back to its caller
    fn handle(&self, store: &Store<S, A, R>, action: A, next: Next<'_, S, A, R>) -> R;
}

impl<S, A, R, F> Middleware<S, A, R> for F
where
    F: Fn(&Store<S, A, R>, A, Next<'_, S, A, R>) -> R + Send + Sync,
{
    fn handle(&self, store: &Store<S, A, R>, action: A, next: Next<'_, S, A, R>) -> R {
        self(store, action, next)
    }
}

/// Wrap a closure as shared middleware
pub fn middleware_fn<S, A, R, F>(f: F) -> Arc<dyn Middleware<S, A, R>>
where
    F: Fn(&Store<S, A, R>, A, Next<'_, S, A, R>) -> R + Send + Sync + 'static,
    S: 'static,
    A: 'static,
    R: 'static,
{
    Arc::new(f)
}

/// Terminal step of a chain
pub(crate) type Terminal<'a, A, R> = &'a (dyn Fn(A) -> R + 'a);

enum Tail<'a, S, A, R> {
    Dispatch(Terminal<'a, A, R>),
    Continue(Box<Next<'a, S, A, R>>),
}

/// Represents the next middleware/handler in the chain
pub struct Next<'a, S, A, R> {
    store: &'a Store<S, A, R>,
    stack: &'a [Arc<dyn Middleware<S, A, R>>],
    tail: Tail<'a, S, A, R>,
}

impl<'a, S, A, R> Next<'a, S, A, R> {
    /// Chain over `stack` ending in the terminal dispatch
    pub(crate) fn new(
        store: &'a Store<S, A, R>,
        stack: &'a [Arc<dyn Middleware<S, A, R>>],
        terminal: Terminal<'a, A, R>,
    ) -> Self {
        Self {
            store,
            stack,
            tail: Tail::Dispatch(terminal),
        }
    }

    /// Chain over `stack` that continues with `next` once exhausted
    fn then(
        store: &'a Store<S, A, R>,
        stack: &'a [Arc<dyn Middleware<S, A, R>>],
        next: Next<'a, S, A, R>,
    ) -> Self {
        Self {
            store,
            stack,
            tail: Tail::Continue(Box::new(next)),
        }
    }

    /// Run the next middleware or the terminal dispatch
    pub fn run(self, action: A) -> R {
        match self.stack.split_first() {
            Some((middleware, rest)) => {
                let next = Self {
                    store: self.store,
                    stack: rest,
                    tail: self.tail,
                };
                middleware.handle(self.store, action, next)
            }
            None => match self.tail {
                Tail::Dispatch(terminal) => terminal(action),
                Tail::Continue(next) => next.run(action),
            },
        }
    }

    /// Middleware left before the terminal dispatch
    pub fn remaining(&self) -> usize {
        let rest = match &self.tail {
            Tail::Dispatch(_) => 0,
            Tail::Continue(next) => next.remaining(),
        };
        self.stack.len() + rest
    }
}

impl<S, A, R> fmt::Debug for Next<'_, S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Middleware chain that behaves as a single middleware
///
/// The first member runs outermost: it sees the action before every later
/// member and before the outer `next`.
pub struct ComposedMiddleware<S, A, R> {
    stack: Arc<[Arc<dyn Middleware<S, A, R>>]>,
}

impl<S, A, R> ComposedMiddleware<S, A, R> {
    /// Pass-through middleware
    pub fn empty() -> Self {
        Self {
            stack: Arc::from(Vec::new()),
        }
    }

    /// Number of composed middleware
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Whether this is the pass-through middleware
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

impl<S, A, R> Clone for ComposedMiddleware<S, A, R> {
    fn clone(&self) -> Self {
        Self {
            stack: Arc::clone(&self.stack),
        }
    }
}

impl<S, A, R> fmt::Debug for ComposedMiddleware<S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedMiddleware")
            .field("middleware", &self.stack.len())
            .finish()
    }
}

impl<S, A, R> Middleware<S, A, R> for ComposedMiddleware<S, A, R> {
    fn handle(&self, store: &Store<S, A, R>, action: A, next: Next<'_, S, A, R>) -> R {
        if self.stack.is_empty() {
            return next.run(action);
        }
        Next::then(store, &self.stack, next).run(action)
    }
}

/// Compose middleware, first element outermost
pub fn compose_middleware<S, A, R, I>(middleware: I) -> ComposedMiddleware<S, A, R>
where
    I: IntoIterator<Item = Arc<dyn Middleware<S, A, R>>>,
{
    ComposedMiddleware {
        stack: middleware.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::reducer_fn;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    type Log = Arc<Mutex<Vec<String>>>;

    fn tagging(log: &Log, tag: &'static str) -> Arc<dyn Middleware<Vec<String>, String, String>> {
        let log = Arc::clone(log);
        middleware_fn(move |_store, action: String, next| {
            log.lock().push(format!("{tag}:{action}"));
            next.run(action)
        })
    }

    fn store_with(
        middleware: Vec<Arc<dyn Middleware<Vec<String>, String, String>>>,
    ) -> Store<Vec<String>, String, String> {
        let reducer = reducer_fn(|mut state: Vec<String>, action: &String| {
            state.push(action.clone());
            state
        });
        middleware
            .into_iter()
            .fold(Store::builder(reducer, Vec::new()), |builder, m| {
                builder.with_middleware(m)
            })
            .build()
    }

    #[test]
    fn test_middleware_chain_order() {
        let log: Log = Arc::default();
        let store = store_with(vec![tagging(&log, "first"), tagging(&log, "second")]);

        let result = store.dispatch("a".to_string());

        assert_eq!(result, "a");
        assert_eq!(*log.lock(), vec!["first:a", "second:a"]);
        assert_eq!(*store.state(), vec!["a".to_string()]);
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let store = store_with(vec![middleware_fn(
            |_store: &Store<Vec<String>, String, String>, action: String, next| {
                if action == "drop" {
                    return "dropped".to_string();
                }
                next.run(action)
            },
        )]);

        assert_eq!(store.dispatch("drop".to_string()), "dropped");
        assert!(store.state().is_empty());
        assert_eq!(store.dispatch("keep".to_string()), "keep");
        assert_eq!(store.state().len(), 1);
    }

    #[test]
    fn test_composed_middleware_runs_before_outer_next() {
        let log: Log = Arc::default();
        let inner: Arc<dyn Middleware<Vec<String>, String, String>> = Arc::new(
            compose_middleware(vec![tagging(&log, "a"), tagging(&log, "b")]),
        );
        let store = store_with(vec![inner, tagging(&log, "outer-next")]);

        store.dispatch("x".to_string());

        assert_eq!(*log.lock(), vec!["a:x", "b:x", "outer-next:x"]);
    }

    #[test]
    fn test_empty_composition_passes_through() {
        let composed: ComposedMiddleware<Vec<String>, String, String> =
            ComposedMiddleware::empty();
        assert!(composed.is_empty());

        let store = store_with(vec![Arc::new(composed)]);
        assert_eq!(store.dispatch("y".to_string()), "y");
        assert_eq!(*store.state(), vec!["y".to_string()]);
    }

    #[test]
    fn test_middleware_can_redispatch() {
        let store = store_with(vec![middleware_fn(
            |store: &Store<Vec<String>, String, String>, action: String, next| {
                if action == "expand" {
                    store.dispatch("one".to_string());
                    store.dispatch("two".to_string());
                }
                next.run(action)
            },
        )]);

        store.dispatch("expand".to_string());

        assert_eq!(
            *store.state(),
            vec!["one".to_string(), "two".to_string(), "expand".to_string()]
        );
    }
}
