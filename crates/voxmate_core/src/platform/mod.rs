//! OS and network seams.
//!
//! # Responsibility
//! - Hide process spawning behind [`CommandRunner`] so OS-name dispatch is
//!   testable without side effects.
//! - Hide HTTP behind [`http::HttpFetch`].
//!
//! # Invariants
//! - Handlers never call `std::process::Command` directly.
//! - Launched children are reaped once they exit; none are left as zombies
//!   for the rest of the session.

use log::debug;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

pub mod http;

/// Operating system family used to pick OS utilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsKind {
    Windows,
    MacOs,
    Linux,
}

impl OsKind {
    /// OS family of the running process. Unknown unix flavors map to `Linux`.
    pub fn current() -> Self {
        Self::from_name(std::env::consts::OS)
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "windows" => Self::Windows,
            "macos" => Self::MacOs,
            _ => Self::Linux,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }
}

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Command without arguments.
    pub fn bare(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Space-joined rendering for logs.
    pub fn display_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Process execution failure.
#[derive(Debug)]
pub enum PlatformError {
    /// Program is not installed or not on `PATH`.
    NotFound(String),
    /// Program exists but could not be started.
    Spawn {
        program: String,
        source: std::io::Error,
    },
    /// Program ran and exited unsuccessfully.
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(program) => write!(f, "program not found: {program}"),
            Self::Spawn { program, source } => write!(f, "failed to start `{program}`: {source}"),
            Self::Failed {
                program,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "`{program}` exited with {code}: {stderr}"),
                None => write!(f, "`{program}` terminated by signal: {stderr}"),
            },
        }
    }
}

impl Error for PlatformError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Process-execution seam for OS utilities.
pub trait CommandRunner {
    fn os(&self) -> OsKind;

    /// Returns whether `program` resolves on this machine.
    fn has_program(&self, program: &str) -> bool;

    /// Runs to completion and returns trimmed stdout.
    fn run(&self, spec: &CommandSpec) -> Result<String, PlatformError>;

    /// Starts a detached process without waiting for it.
    fn launch(&self, spec: &CommandSpec) -> Result<(), PlatformError>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug)]
pub struct SystemCommandRunner {
    os: OsKind,
    /// Detached children not yet seen exiting.
    launched: RefCell<Vec<Child>>,
}

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self {
            os: OsKind::current(),
            launched: RefCell::new(Vec::new()),
        }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemCommandRunner {
    fn os(&self) -> OsKind {
        self.os
    }

    fn has_program(&self, program: &str) -> bool {
        find_program(program).is_some()
    }

    fn run(&self, spec: &CommandSpec) -> Result<String, PlatformError> {
        debug!(
            "event=command_run module=platform status=start command={}",
            spec.display_line()
        );
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| spawn_error(&spec.program, source))?;

        if !output.status.success() {
            return Err(PlatformError::Failed {
                program: spec.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn launch(&self, spec: &CommandSpec) -> Result<(), PlatformError> {
        debug!(
            "event=command_launch module=platform status=start command={}",
            spec.display_line()
        );
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| spawn_error(&spec.program, source))?;

        let mut launched = self.launched.borrow_mut();
        reap_finished(&mut launched);
        launched.push(child);
        Ok(())
    }
}

/// Non-blocking exit check for a detached child.
trait Reapable {
    /// Returns `true` once the child has exited and its status is collected.
    fn reap(&mut self) -> bool;
}

impl Reapable for Child {
    fn reap(&mut self) -> bool {
        // An error means the child can no longer be waited on either.
        !matches!(self.try_wait(), Ok(None))
    }
}

fn reap_finished<C: Reapable>(children: &mut Vec<C>) {
    children.retain_mut(|child| !child.reap());
}

fn spawn_error(program: &str, source: std::io::Error) -> PlatformError {
    if source.kind() == std::io::ErrorKind::NotFound {
        PlatformError::NotFound(program.to_string())
    } else {
        PlatformError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

/// Resolves `program` against `PATH` (and `PATHEXT`-style `.exe` on Windows).
pub fn find_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let with_exe = dir.join(format!("{program}.exe"));
            if with_exe.is_file() {
                return Some(with_exe);
            }
        }
        None
    })
}

#[cfg(test)]
mod tests {
    use super::{reap_finished, CommandSpec, OsKind, Reapable};

    struct ExitsAfter {
        polls_left: u32,
    }

    impl Reapable for ExitsAfter {
        fn reap(&mut self) -> bool {
            if self.polls_left == 0 {
                return true;
            }
            self.polls_left -= 1;
            false
        }
    }

    #[test]
    fn maps_os_names_to_families() {
        assert_eq!(OsKind::from_name("windows"), OsKind::Windows);
        assert_eq!(OsKind::from_name("macos"), OsKind::MacOs);
        assert_eq!(OsKind::from_name("linux"), OsKind::Linux);
        assert_eq!(OsKind::from_name("freebsd"), OsKind::Linux);
    }

    #[test]
    fn renders_command_line_for_logs() {
        let spec = CommandSpec::new("shutdown", ["/s", "/t", "10"]);
        assert_eq!(spec.display_line(), "shutdown /s /t 10");
    }

    #[test]
    fn reaping_drops_only_exited_children() {
        let mut children = vec![ExitsAfter { polls_left: 0 }, ExitsAfter { polls_left: 2 }];
        reap_finished(&mut children);
        assert_eq!(children.len(), 1);
        reap_finished(&mut children);
        assert_eq!(children.len(), 1);
        reap_finished(&mut children);
        assert!(children.is_empty());
    }
}
