use crate::errors::CallbackError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

mod lock;
pub use lock::ExecutionLock;

mod value;
pub use value::{Callable, Kwargs, Value};

/// Everything a worker needs to call back into the host once. Each run takes
/// its own references and releases them after the call.
#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub(crate) callable: Callable,
    pub(crate) args: Arc<[Value]>,
    pub(crate) kwargs: Arc<Kwargs>,
}

/// Bridge from a timer thread back into host code.
#[derive(Debug, Clone)]
pub(crate) struct CallbackInvoker {
    lock: Option<ExecutionLock>,
}

impl CallbackInvoker {
    pub(crate) fn new(lock: Option<ExecutionLock>) -> Self {
        Self { lock }
    }

    /// Calls the callback while holding the execution lock, if any.
    ///
    /// The lock covers the call and the error report only. A failed or
    /// panicking callback is logged here and handed back to the worker, which
    /// drops it.
    pub(crate) fn invoke(&self, invocation: Invocation) -> Result<Value, CallbackError> {
        let Invocation {
            callable,
            args,
            kwargs,
        } = invocation;

        let res = {
            let _guard = self.lock.as_ref().map(ExecutionLock::acquire);

            let res = panic::catch_unwind(AssertUnwindSafe(|| callable.call(&args, &kwargs)))
                .unwrap_or_else(|payload| Err(CallbackError::Panicked(panic_message(&*payload))));

            if let Err(e) = &res {
                tracing::error!(error = %e, "timer callback failed");
            }

            res
        };

        // Both argument sets are released the same way, right after the call.
        drop(args);
        drop(kwargs);

        res
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}
