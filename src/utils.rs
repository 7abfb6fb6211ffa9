use anyhow::Result;
use std::process::Command;

/// Where tweak commands end up. Swappable so callers can preview or record.
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<()>;
}

/// Runs commands for real, elevated where the platform needs it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElevatedShell;

impl CommandRunner for ElevatedShell {
    fn run(&self, command: &str) -> Result<()> {
        execute_command(command)
    }
}

/// Logs commands instead of running them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRun;

impl CommandRunner for DryRun {
    fn run(&self, command: &str) -> Result<()> {
        tracing::info!(command, "dry run, not executing");
        Ok(())
    }
}

#[cfg(windows)]
pub fn invocation(command: &str) -> (&'static str, Vec<String>) {
    (
        "powershell",
        vec![
            "-Command".to_string(),
            format!(
                "Start-Process powershell -ArgumentList \"{}\" -Verb RunAs -WindowStyle Hidden",
                command
            ),
        ],
    )
}

#[cfg(not(windows))]
pub fn invocation(command: &str) -> (&'static str, Vec<String>) {
    ("sh", vec!["-c".to_string(), command.to_string()])
}

pub fn execute_command(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Ok(());
    }

    let (program, args) = invocation(command);
    tracing::debug!(program, command, "executing");
    let status = Command::new(program).args(&args).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Command failed with status: {}", status))
    }
}
