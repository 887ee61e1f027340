//! REST service expressed as a [`Task`](task_runner::Task).
//!
//! Drive it with a one-shot [`TaskRunner`](task_runner::TaskRunner): `init` binds the
//! listener and builds the router, `run` serves until the runner is stopped, and the stop
//! drains in-flight connections within [`RestConfig::drain_timeout`].

pub mod error;
pub mod task;

pub use config_loader::rest::RestConfig;
pub use error::RestError;
pub use task::{BindScope, RestTask};
