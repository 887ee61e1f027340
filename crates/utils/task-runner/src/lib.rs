pub use tokio_util::sync::CancellationToken;
pub mod error;
pub use error::{BoxError, PhaseResult, TaskError, TaskErrorKind, TaskResult};
pub use runner::{Schedule, TaskRunner};
pub use shutdown::ShutdownSignal;
pub use tasks::{Phase, Task};
pub mod runner;
pub mod shutdown;
pub mod tasks;
