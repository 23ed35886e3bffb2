// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::routines as rt;
use rt::error::DiagError;

/// Live termination status of a tracked child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    StillRunning,
    /// Exited with a zero exit code.
    ExitedOk,
    /// Exited with a non-zero code or was terminated by a signal.
    ExitedError,
    LaunchFailed,
    Unknown,
}

/// A started OS process, as seen by the routine engine.
///
/// Implementations must never block: `poll_status` only observes the current
/// state and `kill` only delivers the signal.
pub trait ChildProcess {
    fn pid(&self) -> Option<u32>;
    fn poll_status(&mut self) -> ProcessStatus;
    fn kill(&mut self) -> Result<(), DiagError>;
}

/// Capability for launching external programs.
pub trait ProcessAdapter {
    fn start(&self, argv: &[String]) -> Result<ProcessHandle, DiagError>;
}

/// Owned handle to a child process.
///
/// Dropping a handle whose process is still alive kills the process, so a
/// routine can never leak its child.
pub struct ProcessHandle {
    process: Box<dyn ChildProcess + Send + 'static>,
    kill_requested: bool,
}

impl ProcessHandle {
    pub fn new(process: Box<dyn ChildProcess + Send + 'static>) -> Self {
        ProcessHandle {
            process,
            kill_requested: false,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.pid()
    }

    pub fn poll_status(&mut self) -> ProcessStatus {
        self.process.poll_status()
    }

    pub fn kill(&mut self) -> Result<(), DiagError> {
        self.kill_requested = true;
        self.process.kill()
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if self.process.poll_status() != ProcessStatus::StillRunning {
            return;
        }

        let pid = self.process.pid();
        if self.kill_requested {
            tracing::debug!(?pid, "child process still exiting at teardown, killing again");
        } else {
            tracing::warn!(?pid, "child process still running at teardown, killing it");
        }

        if let Err(e) = self.process.kill() {
            tracing::error!(?pid, error = %e, "failed to kill child process at teardown");
        }
    }
}

/// Process adapter backed by `tokio::process`.
///
/// Spawning needs to happen inside a tokio runtime, otherwise the launch
/// fails; polling and killing do not block on it.
#[derive(Debug, Default, Clone)]
pub struct TokioProcessAdapter {}

impl TokioProcessAdapter {
    pub fn new() -> Self {
        TokioProcessAdapter {}
    }
}

impl ProcessAdapter for TokioProcessAdapter {
    fn start(&self, argv: &[String]) -> Result<ProcessHandle, DiagError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(DiagError::Launch {
                program: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command line"),
            });
        };

        // spawning registers the child with the runtime's reactor
        if let Err(e) = tokio::runtime::Handle::try_current() {
            return Err(DiagError::Launch {
                program: program.clone(),
                source: io::Error::other(e),
            });
        }

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false)
            .spawn()
            .map_err(|source| DiagError::Launch {
                program: program.clone(),
                source,
            })?;

        tracing::debug!(pid = ?child.id(), %program, "launched child process");
        Ok(ProcessHandle::new(Box::new(TokioChildProcess { child })))
    }
}

struct TokioChildProcess {
    child: Child,
}

impl ChildProcess for TokioChildProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn poll_status(&mut self) -> ProcessStatus {
        match self.child.try_wait() {
            Ok(None) => ProcessStatus::StillRunning,
            Ok(Some(status)) if status.success() => ProcessStatus::ExitedOk,
            Ok(Some(_)) => ProcessStatus::ExitedError,
            Err(e) => {
                tracing::warn!(error = %e, "failed to query child process status");
                ProcessStatus::Unknown
            }
        }
    }

    fn kill(&mut self) -> Result<(), DiagError> {
        self.child.start_kill().map_err(DiagError::Kill)
    }
}
