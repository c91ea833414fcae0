//! Docker-backed service runtime.

use std::process::Command;

use tracing::debug;

use super::ServiceRuntime;
use crate::error::ToolError;

pub const DEFAULT_DOCKER_BINARY: &str = "docker";
pub const DEFAULT_ADMIN_COMMAND: &str = "rcon-cli";

/// Drives a container through the docker CLI.
///
/// Admin commands run as `docker exec <container> <admin_command> <command>`.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    binary: String,
    admin_command: String,
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_BINARY, DEFAULT_ADMIN_COMMAND)
    }
}

impl DockerRuntime {
    pub fn new(binary: impl Into<String>, admin_command: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            admin_command: admin_command.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<(), ToolError> {
        let rendered = render(&self.binary, args);
        debug!(command = %rendered, "Running docker command");

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|source| ToolError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                command: rendered,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl ServiceRuntime for DockerRuntime {
    fn stop(&self, name: &str) -> Result<(), ToolError> {
        self.run(&["stop", name])
    }

    fn start(&self, name: &str) -> Result<(), ToolError> {
        self.run(&["start", name])
    }

    fn exec_admin_command(&self, name: &str, command: &str) -> Result<(), ToolError> {
        self.run(&["exec", name, &self.admin_command, command])
    }
}

fn render(binary: &str, args: &[&str]) -> String {
    let mut rendered = binary.to_string();
    for arg in args {
        rendered.push(' ');
        if arg.contains(char::is_whitespace) {
            rendered.push('"');
            rendered.push_str(arg);
            rendered.push('"');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}
