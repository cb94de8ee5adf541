use crate::config::PickerConfig;
use crate::process::{run_captured, CancelToken};
use crate::types::BinaryHealth;
use std::process::Command;
use tracing::debug;

/// Runs `<program> --version` to see whether the tool can be spawned.
pub fn check_binary(program: &str) -> BinaryHealth {
    let mut command = Command::new(program);
    command.arg("--version");

    match run_captured(command, None, &CancelToken::new()) {
        Ok(stdout) => {
            let version = String::from_utf8_lossy(&stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty());
            debug!("HEALTH: {} available ({:?})", program, version);
            BinaryHealth {
                program: program.to_string(),
                available: true,
                version,
                error: None,
            }
        }
        Err(e) => {
            debug!("HEALTH: {} unavailable: {}", program, e);
            BinaryHealth {
                program: program.to_string(),
                available: false,
                version: None,
                error: Some(e.to_string()),
            }
        }
    }
}

pub fn check_binaries(config: &PickerConfig) -> Vec<BinaryHealth> {
    vec![check_binary(&config.fd_bin), check_binary(&config.fzf_bin)]
}
