//! Process-wide scheduler configuration, resolved from the environment once at scheduler
//! construction time.

use std::env;

use crate::error::{Result, SchedKernelError};

/// How tasks assigned to the same host relate to each other in time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TaskExecutionMode {
    /// Consecutive host tasks get a synthetic precedence edge; they never overlap.
    Sequential,
    /// No extra constraints; tasks on the same host may run concurrently.
    Parallel,
}

/// Controls *when* an input-data transfer becomes schedulable, relative to its consumer's
/// position and the rest of the host's task list. Applies only in [`TaskExecutionMode::Sequential`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataTransferMode {
    Eager,
    Lazy,
    Prefetch,
    Queue,
    QueueEct,
    Parents,
    LazyParents,
}

/// When an assignment becomes visible to the simulator relative to when execution starts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchMode {
    FreeHost,
    Immediate,
    ParentsDone,
    ImmediateOverlap,
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub task_execution: TaskExecutionMode,
    pub data_transfer: DataTransferMode,
    pub dispatch_mode: DispatchMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_execution: TaskExecutionMode::Sequential,
            data_transfer: DataTransferMode::Eager,
            dispatch_mode: DispatchMode::FreeHost,
        }
    }
}

impl SchedulerConfig {
    /// Reads `TASK_EXECUTION`, `DATA_TRANSFER` and `DISPATCH_MODE` from the environment,
    /// falling back to their defaults when unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(v) = env::var("TASK_EXECUTION") {
            config.task_execution = match v.as_str() {
                "SEQUENTIAL" => TaskExecutionMode::Sequential,
                "PARALLEL" => TaskExecutionMode::Parallel,
                other => return Err(SchedKernelError::ConfigurationError(format!("unknown TASK_EXECUTION: {other}"))),
            };
        }
        if let Ok(v) = env::var("DATA_TRANSFER") {
            config.data_transfer = match v.as_str() {
                "EAGER" => DataTransferMode::Eager,
                "LAZY" => DataTransferMode::Lazy,
                "PREFETCH" => DataTransferMode::Prefetch,
                "QUEUE" => DataTransferMode::Queue,
                "QUEUE_ECT" => DataTransferMode::QueueEct,
                "PARENTS" => DataTransferMode::Parents,
                "LAZY_PARENTS" => DataTransferMode::LazyParents,
                other => return Err(SchedKernelError::ConfigurationError(format!("unknown DATA_TRANSFER: {other}"))),
            };
        }
        if let Ok(v) = env::var("DISPATCH_MODE") {
            config.dispatch_mode = match v.as_str() {
                "FREE_HOST" => DispatchMode::FreeHost,
                "IMMEDIATE" => DispatchMode::Immediate,
                "PARENTS_DONE" => DispatchMode::ParentsDone,
                "IMMEDIATE_OVERLAP" => DispatchMode::ImmediateOverlap,
                other => return Err(SchedKernelError::ConfigurationError(format!("unknown DISPATCH_MODE: {other}"))),
            };
        }
        Ok(config)
    }

    /// `QUEUE_ECT` requires an algorithm that publishes per-task ECT predictions (HEFT,
    /// Lookahead); this is checked explicitly because it cannot be derived from the enum alone.
    pub fn validate_queue_ect(&self, algorithm_publishes_ect: bool) -> Result<()> {
        if self.data_transfer == DataTransferMode::QueueEct && !algorithm_publishes_ect {
            return Err(SchedKernelError::ConfigurationError(
                "DATA_TRANSFER=QUEUE_ECT requires an algorithm that publishes per-task ECT (HEFT, Lookahead)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
