//! Control of the running game server.

mod docker;

pub use docker::{DEFAULT_ADMIN_COMMAND, DEFAULT_DOCKER_BINARY, DockerRuntime};

use crate::error::ToolError;

/// Start/stop a named service and run admin console commands inside it.
pub trait ServiceRuntime {
    fn stop(&self, name: &str) -> Result<(), ToolError>;

    fn start(&self, name: &str) -> Result<(), ToolError>;

    /// Run a console command (e.g. `say ...`) inside the service.
    fn exec_admin_command(&self, name: &str, command: &str) -> Result<(), ToolError>;
}
