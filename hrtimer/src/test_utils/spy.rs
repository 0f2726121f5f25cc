use crate::invoke::{Callable, Kwargs, Value};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub(crate) args: Vec<Value>,
    pub(crate) kwargs: Kwargs,
    pub(crate) thread_name: Option<String>,
    pub(crate) at: Instant,
}

/// Records every invocation of the callable it hands out.
#[derive(Debug, Clone)]
pub(crate) struct SpyCallback {
    calls: Arc<RwLock<Vec<Call>>>,
}

impl SpyCallback {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub(crate) fn callable(&self) -> Callable {
        let calls = self.calls.clone();

        Callable::new(move |args, kwargs| {
            calls.write().push(Call {
                args: args.to_vec(),
                kwargs: kwargs.clone(),
                thread_name: thread::current().name().map(str::to_string),
                at: Instant::now(),
            });
            Ok(Value::None)
        })
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.read().clone()
    }

    pub(crate) fn num_calls(&self) -> usize {
        self.calls.read().len()
    }
}
