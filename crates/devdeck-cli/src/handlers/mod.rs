//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that call the `ProcessManager` and format terminal output
//!
//! Supervision logic stays in `devdeck-runtime`.

pub mod group;
pub mod kill_port;
pub mod list;
pub mod probe;
mod tail;
pub mod up;
