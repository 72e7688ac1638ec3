//! Task layer: prompt templates and the dispatcher that runs them.

pub mod dispatcher;
pub mod templates;

pub use dispatcher::{TaskDispatcher, TaskRequest, TaskResult};
