//! Task and result types carried through the pool.

use crate::error::{BoxError, TaskError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Execution function of a task: consumes the argument, produces a value or an error.
pub type ExecFn<A, V> = Box<dyn FnOnce(&TaskContext, A) -> Result<V, BoxError> + Send>;

/// Identity of a task, copied verbatim into its result for correlation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: String,
    pub kind: String,
    pub metadata: BTreeMap<String, String>,
}

impl TaskDescriptor {
    /// Create a descriptor of the given kind with a random UUID v4 id.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: kind.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Information handed to an execution function about where it runs.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pool_name: Arc<str>,
    worker_id: usize,
}

impl TaskContext {
    pub(crate) fn new(pool_name: Arc<str>, worker_id: usize) -> Self {
        Self {
            pool_name,
            worker_id,
        }
    }

    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }
}

/// A unit of work: descriptor, argument and the function to run on it.
///
/// A task missing either its argument or its function is a "fake" task. It
/// still flows through the pool and comes out as [`TaskError::FakeTask`].
pub struct Task<A, V> {
    pub descriptor: TaskDescriptor,
    argument: Option<A>,
    exec: Option<ExecFn<A, V>>,
}

impl<A, V> Task<A, V> {
    pub fn new<F>(descriptor: TaskDescriptor, argument: A, exec: F) -> Self
    where
        F: FnOnce(&TaskContext, A) -> Result<V, BoxError> + Send + 'static,
    {
        Self {
            descriptor,
            argument: Some(argument),
            exec: Some(Box::new(exec)),
        }
    }

    /// Build a task from optional parts; either part may be missing.
    pub fn from_parts(
        descriptor: TaskDescriptor,
        argument: Option<A>,
        exec: Option<ExecFn<A, V>>,
    ) -> Self {
        Self {
            descriptor,
            argument,
            exec,
        }
    }

    pub fn fake(descriptor: TaskDescriptor) -> Self {
        Self::from_parts(descriptor, None, None)
    }

    pub fn is_fake(&self) -> bool {
        self.argument.is_none() || self.exec.is_none()
    }

    pub(crate) fn execute(self, context: &TaskContext) -> TaskResult<V> {
        let outcome = match (self.argument, self.exec) {
            (Some(argument), Some(exec)) => exec(context, argument).map_err(TaskError::Execution),
            _ => Err(TaskError::FakeTask),
        };

        TaskResult {
            descriptor: self.descriptor,
            outcome,
        }
    }
}

impl<A, V> Default for Task<A, V> {
    fn default() -> Self {
        Self::fake(TaskDescriptor::default())
    }
}

impl<A, V> fmt::Debug for Task<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("descriptor", &self.descriptor)
            .field("has_argument", &self.argument.is_some())
            .field("has_exec", &self.exec.is_some())
            .finish()
    }
}

/// Outcome of a task, emitted on the pool's output channel.
#[derive(Debug)]
pub struct TaskResult<V> {
    pub descriptor: TaskDescriptor,
    pub outcome: Result<V, TaskError>,
}

impl<V> TaskResult<V> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&V> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.as_ref().err()
    }

    pub fn into_value(self) -> Option<V> {
        self.outcome.ok()
    }
}
