//! Timed shutdown / restart, handed to Windows' `shutdown` tool.

use anyhow::Result;
use std::fmt;
use std::str::FromStr;

use crate::utils::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Shutdown,
    Restart,
    /// Restart straight into the firmware (BIOS/UEFI) setup.
    Firmware,
}

impl PowerAction {
    fn flags(self) -> &'static str {
        match self {
            PowerAction::Shutdown => "'-s','-f'",
            PowerAction::Restart => "'-r','-f'",
            PowerAction::Firmware => "'-r','-fw'",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerAction::Shutdown => "shutdown",
            PowerAction::Restart => "restart",
            PowerAction::Firmware => "firmware",
        })
    }
}

impl FromStr for PowerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shutdown" => Ok(PowerAction::Shutdown),
            "restart" => Ok(PowerAction::Restart),
            "firmware" | "bios" => Ok(PowerAction::Firmware),
            other => Err(format!(
                "unknown power action '{}' (expected shutdown, restart or firmware)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delay {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// Longest timeout `shutdown /t` accepts: ten years.
pub const MAX_DELAY_SECONDS: u64 = 315_360_000;

impl Delay {
    pub fn total_seconds(&self) -> Result<u64> {
        let total = self
            .hours
            .checked_mul(3600)
            .and_then(|h| self.minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(self.seconds))
            .filter(|&total| total <= MAX_DELAY_SECONDS);
        total.ok_or_else(|| {
            anyhow::anyhow!(
                "delay of {}h {}m {}s exceeds the maximum of {} seconds",
                self.hours,
                self.minutes,
                self.seconds,
                MAX_DELAY_SECONDS
            )
        })
    }
}

pub fn schedule_command(action: PowerAction, delay: Delay) -> Result<String> {
    Ok(format!(
        "Start-Process shutdown -ArgumentList {},'-t {}'",
        action.flags(),
        delay.total_seconds()?
    ))
}

pub fn schedule(action: PowerAction, delay: Delay, runner: &dyn CommandRunner) -> Result<String> {
    let seconds = delay.total_seconds()?;
    let command = schedule_command(action, delay)?;
    tracing::info!(%action, seconds, "scheduling power action");
    runner.run(&command)?;
    Ok(command)
}
