use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, warn};

/// Lets another thread terminate the child a request is waiting on.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Default)]
struct CancelInner {
    cancelled: AtomicBool,
    child: Mutex<Option<Child>>,
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Marks the request cancelled and kills its child if one is running.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);

        let mut slot = match self.inner.child.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(child) = slot.as_mut() {
            debug!("CANCEL: killing child pid {}", child.id());
            if let Err(e) = child.kill() {
                debug!("CANCEL: kill failed (child likely exited): {}", e);
            }
        }
    }

    fn attach(&self, mut child: Child) {
        let mut slot = match self.inner.child.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A cancel that raced the spawn never saw this child.
        if self.is_cancelled() {
            let _ = child.kill();
        }
        *slot = Some(child);
    }

    fn detach(&self) -> Option<Child> {
        match self.inner.child.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

/// Runs `command` to completion with piped stdio and returns its stdout.
///
/// `input`, when given, is written to the child's stdin from a separate
/// thread so a child that produces output before draining its input cannot
/// deadlock us. Any stderr output fails the run whatever the exit status.
pub fn run_captured(
    mut command: Command,
    input: Option<&[u8]>,
    cancel: &CancelToken,
) -> Result<Vec<u8>> {
    let program = command.get_program().to_string_lossy().into_owned();

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|source| Error::Spawn {
        program: program.clone(),
        source,
    })?;
    debug!("SPAWN: {} started with pid {}", program, child.id());

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    cancel.attach(child);

    let (stdout_result, stderr_result) = thread::scope(|s| {
        if let (Some(mut stdin), Some(input)) = (stdin, input) {
            s.spawn(move || {
                // Broken pipe here means the child stopped reading, which the
                // exit path reports better than we can.
                if let Err(e) = stdin.write_all(input) {
                    debug!("STDIN: write stopped early: {}", e);
                }
            });
        }

        let stderr_handle = s.spawn(move || -> std::io::Result<Vec<u8>> {
            let mut buffer = Vec::new();
            if let Some(mut stderr) = stderr {
                stderr.read_to_end(&mut buffer)?;
            }
            Ok(buffer)
        });

        let mut buffer = Vec::with_capacity(4096);
        let stdout_result = match stdout {
            Some(mut stdout) => stdout.read_to_end(&mut buffer).map(|_| buffer),
            None => Ok(buffer),
        };

        let stderr_result = stderr_handle
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::other("stderr reader panicked")));

        (stdout_result, stderr_result)
    });

    let status = match cancel.detach() {
        Some(mut child) => Some(child.wait().map_err(|e| Error::io(&program, e))?),
        None => None,
    };

    if cancel.is_cancelled() {
        debug!("CANCEL: {} finished after cancellation, dropping output", program);
        return Err(Error::Cancelled);
    }

    let stdout = stdout_result.map_err(|e| Error::io(&program, e))?;
    let stderr = stderr_result.map_err(|e| Error::io(&program, e))?;

    if !stderr.is_empty() {
        let message = String::from_utf8_lossy(&stderr).trim().to_string();
        warn!("PROCESS_ERROR: {} wrote to stderr: {}", program, message);
        return Err(Error::Stderr { program, message });
    }

    debug!(
        "EXIT: {} exited with {:?}, {} bytes of output",
        program,
        status.and_then(|s| s.code()),
        stdout.len()
    );
    Ok(stdout)
}

#[cfg(all(test, unix))]
pub(crate) mod test_support {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// Writes an executable `/bin/sh` script standing in for an external tool.
    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }
}
