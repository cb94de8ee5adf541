use crate::config::PickerConfig;
use crate::error::Result;
use crate::process::{run_captured, CancelToken};
use crate::types::RawListing;
use std::ffi::OsString;
use std::process::Command;
use tracing::info;

/// Produces the newline-delimited folder listing a picking session filters.
pub trait FolderLister: Send + Sync {
    fn list_folders(&self) -> Result<RawListing>;
}

/// Lists folders by running `fd` under the configured base directory.
#[derive(Debug, Clone)]
pub struct FdLister {
    program: String,
    args: Vec<OsString>,
}

impl FdLister {
    pub fn new(config: &PickerConfig) -> Self {
        let mut base_dir_arg = OsString::from("--base-directory=");
        base_dir_arg.push(&config.base_dir);

        let mut args = Vec::with_capacity(config.exclude.len() + 2);
        args.push(base_dir_arg);
        args.push(OsString::from("--type=d"));
        args.extend(
            config
                .exclude
                .iter()
                .map(|pattern| OsString::from(format!("--exclude={pattern}"))),
        );

        Self {
            program: config.fd_bin.clone(),
            args,
        }
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl FolderLister for FdLister {
    fn list_folders(&self) -> Result<RawListing> {
        let start = std::time::Instant::now();
        info!("LIST_START: running {} {:?}", self.program, self.args);

        let stdout = run_captured(self.command(), None, &CancelToken::new())?;

        info!(
            "LIST_COMPLETE: {} bytes of listing in {:?}",
            stdout.len(),
            start.elapsed()
        );
        Ok(RawListing::new(stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn builds_one_exclude_flag_per_pattern() {
        let mut config = PickerConfig::with_base_dir("/home/me");
        config.exclude = vec!["node_modules".into(), ".git".into()];

        let lister = FdLister::new(&config);
        assert_eq!(
            lister.args(),
            &[
                OsString::from("--base-directory=/home/me"),
                OsString::from("--type=d"),
                OsString::from("--exclude=node_modules"),
                OsString::from("--exclude=.git"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn returns_the_scanner_stdout_verbatim() {
        use crate::process::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let fd = write_script(dir.path(), "fake-fd", "printf 'src/\\nsrc/a/\\n'");

        let mut config = PickerConfig::with_base_dir(dir.path());
        config.fd_bin = fd.to_string_lossy().into_owned();

        let listing = FdLister::new(&config).list_folders().unwrap();
        assert_eq!(listing.as_bytes(), b"src/\nsrc/a/\n");
    }

    #[cfg(unix)]
    #[test]
    fn passes_arguments_without_a_shell() {
        use crate::process::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        // Echo every argument on its own line.
        let fd = write_script(dir.path(), "args-fd", "for a in \"$@\"; do echo \"$a\"; done");

        let mut config = PickerConfig::with_base_dir(dir.path());
        config.fd_bin = fd.to_string_lossy().into_owned();
        config.exclude = vec!["$(touch pwned); *".into()];

        let listing = FdLister::new(&config).list_folders().unwrap();
        let lines: Vec<&str> = std::str::from_utf8(listing.as_bytes())
            .unwrap()
            .lines()
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "--type=d");
        assert_eq!(lines[2], "--exclude=$(touch pwned); *");
        assert!(!dir.path().join("pwned").exists());
    }

    #[cfg(unix)]
    #[test]
    fn scanner_stderr_fails_the_listing() {
        use crate::process::test_support::write_script;

        let dir = tempfile::tempdir().unwrap();
        let fd = write_script(dir.path(), "broken-fd", "echo \"[fd error]: bad base\" >&2");

        let mut config = PickerConfig::with_base_dir(dir.path());
        config.fd_bin = fd.to_string_lossy().into_owned();

        let err = FdLister::new(&config).list_folders().unwrap_err();
        assert!(matches!(err, Error::Stderr { .. }));
    }
}
