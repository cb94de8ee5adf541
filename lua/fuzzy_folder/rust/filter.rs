use crate::config::PickerConfig;
use crate::error::Result;
use crate::process::{run_captured, CancelToken};
use crate::types::RawListing;
use std::process::Command;
use tracing::debug;

/// Narrows a listing down to the lines matching `query`, best match first.
pub trait FuzzyFilter: Send + Sync {
    fn filter(&self, listing: &RawListing, query: &str, cancel: &CancelToken) -> Result<Vec<u8>>;
}

/// Filters through `fzf --filter`, feeding the listing on stdin.
#[derive(Debug, Clone)]
pub struct FzfFilter {
    program: String,
}

impl FzfFilter {
    pub fn new(config: &PickerConfig) -> Self {
        Self {
            program: config.fzf_bin.clone(),
        }
    }

    /// The query travels as a single argv entry and is never seen by a shell.
    pub fn args(query: &str) -> Vec<String> {
        vec![format!("--filter={query}")]
    }
}

impl FuzzyFilter for FzfFilter {
    fn filter(&self, listing: &RawListing, query: &str, cancel: &CancelToken) -> Result<Vec<u8>> {
        if query.is_empty() {
            return Ok(listing.as_bytes().to_vec());
        }

        let start = std::time::Instant::now();
        let mut command = Command::new(&self.program);
        command.args(Self::args(query));

        let stdout = run_captured(command, Some(listing.as_bytes()), cancel)?;
        debug!(
            "FILTER: query='{}' matched {} bytes of {} in {:?}",
            query,
            stdout.len(),
            listing.len(),
            start.elapsed()
        );
        Ok(stdout)
    }
}
