// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-walk evaluator for tl programs.
//!
//! Executes a parsed [`Environment`](tl_ast::Environment) directly, with
//! runtime type checks, per-call frames and fire-and-await async calls.

mod error;
mod eval;
mod host;
mod link;
mod tasks;

pub use error::{RuntimeDiagnostic, RuntimeError};
pub use eval::{Evaluator, RunReport};
pub use host::{CapturedHost, StdHost};
pub use link::export_module;
pub use tasks::{LeakedTask, WorkerPool};
