//! Ambient resolution context for the calling thread
//!
//! Connector code that resolves providers by name, rather than through an
//! explicit reference, sees the context of the connector currently being
//! driven. [`run_in_context`] installs a context for the duration of a call
//! and restores the previous one on every exit path, including panics.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use dlink_core::Result;

use crate::isolation::IsolatedContext;
use crate::resolver::{ModuleResolver, Symbol};

thread_local! {
    static CURRENT: RefCell<Option<Arc<IsolatedContext>>> = const { RefCell::new(None) };
}

/// Guard holding a context installed on this thread.
///
/// Dropping it reinstates whatever was current before.
#[must_use = "the context is uninstalled as soon as the scope is dropped"]
pub struct ContextScope {
    previous: Option<Arc<IsolatedContext>>,
    // Scopes are tied to the thread whose slot they swapped.
    _not_send: PhantomData<*const ()>,
}

impl ContextScope {
    pub fn enter(context: &Arc<IsolatedContext>) -> Self {
        let previous = CURRENT.with(|slot| slot.replace(Some(Arc::clone(context))));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Run `f` with `context` as this thread's ambient context
pub fn run_in_context<T>(context: &Arc<IsolatedContext>, f: impl FnOnce() -> T) -> T {
    let _scope = ContextScope::enter(context);
    f()
}

/// The context installed on this thread, if any
pub fn current() -> Option<Arc<IsolatedContext>> {
    CURRENT.with(|slot| slot.borrow().clone())
}

/// Resolve through the ambient context, or `host` when none is installed
pub fn resolve(name: &str, host: &dyn ModuleResolver) -> Result<Symbol> {
    match current() {
        Some(context) => context.resolve(name),
        None => host.find_symbol(name).ok_or_else(|| {
            dlink_core::LinkError::Isolation(format!("'{}' not found in {}", name, host.origin()))
        }),
    }
}
