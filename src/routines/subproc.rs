// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;

use crate::routines as rt;
use rt::config::{Config, TimestampProvider};
use rt::process::{ProcessAdapter, ProcessHandle, ProcessStatus};
use rt::routine::{
    Routine, RoutineSnapshot, PROGRESS_PERCENT_COMPLETE, PROGRESS_PERCENT_UNKNOWN,
};
use rt::RoutineStatus;

pub const SUBPROC_READY_MESSAGE: &str = "Test is ready to run.";
pub const SUBPROC_RUNNING_MESSAGE: &str = "Test is still running.";
pub const SUBPROC_CANCELLING_MESSAGE: &str = "Test is being cancelled.";
pub const SUBPROC_SUCCEEDED_MESSAGE: &str = "Test passed.";
pub const SUBPROC_FAILED_MESSAGE: &str = "Test failed. The diagnostic program reported a failure.";
pub const SUBPROC_ERROR_MESSAGE: &str = "Test ended with an unexpected process state.";
pub const SUBPROC_CANCELLED_MESSAGE: &str = "Test was cancelled.";
pub const SUBPROC_FAILED_TO_LAUNCH_MESSAGE: &str = "Test failed to start.";
pub const SUBPROC_FAILED_TO_STOP_MESSAGE: &str = "Test failed to stop.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubprocStatus {
    Ready,
    LaunchFailed,
    Running,
    Cancelling,
    CompleteSuccess,
    CompleteFailure,
    Error,
    Cancelled,
}

impl SubprocStatus {
    fn to_routine_status(self) -> RoutineStatus {
        match self {
            SubprocStatus::Ready => RoutineStatus::Ready,
            SubprocStatus::LaunchFailed => RoutineStatus::FailedToStart,
            SubprocStatus::Running => RoutineStatus::Running,
            SubprocStatus::Cancelling => RoutineStatus::Cancelling,
            SubprocStatus::CompleteSuccess => RoutineStatus::Passed,
            SubprocStatus::CompleteFailure => RoutineStatus::Failed,
            SubprocStatus::Error => RoutineStatus::Error,
            SubprocStatus::Cancelled => RoutineStatus::Cancelled,
        }
    }
}

/// A routine whose verdict is the exit status of an external program.
pub struct SubprocRoutine {
    command_line: Vec<String>,
    predicted_duration_secs: Option<u32>,
    adapter: Arc<dyn ProcessAdapter + Send + Sync + 'static>,
    timestamp_provider: Arc<dyn TimestampProvider + Send + Sync + 'static>,

    status: SubprocStatus,
    error_message: &'static str,
    process: Option<ProcessHandle>,
    start_time: Option<chrono::DateTime<chrono_tz::Tz>>,
    last_progress_percent: u32,
}

impl SubprocRoutine {
    /// Creates a routine that will run `command_line` once started.
    ///
    /// When `predicted_duration_secs` is given, progress is interpolated over
    /// that duration; otherwise a fixed placeholder percentage is reported.
    pub fn new(
        config: &Config,
        command_line: Vec<String>,
        predicted_duration_secs: Option<u32>,
    ) -> Self {
        let predicted_duration_secs = predicted_duration_secs.filter(|secs| *secs > 0);
        SubprocRoutine {
            command_line,
            predicted_duration_secs,
            adapter: Arc::clone(&config.process_adapter),
            timestamp_provider: Arc::clone(&config.timestamp_provider),
            status: SubprocStatus::Ready,
            error_message: SUBPROC_ERROR_MESSAGE,
            process: None,
            start_time: None,
            last_progress_percent: match predicted_duration_secs {
                Some(_) => 0,
                None => PROGRESS_PERCENT_UNKNOWN,
            },
        }
    }

    fn check_process_status(&mut self) {
        if !matches!(
            self.status,
            SubprocStatus::Running | SubprocStatus::Cancelling
        ) {
            return;
        }
        let Some(process) = self.process.as_mut() else {
            return;
        };

        let cancelling = self.status == SubprocStatus::Cancelling;
        let next = match process.poll_status() {
            ProcessStatus::StillRunning => return,
            ProcessStatus::ExitedOk | ProcessStatus::ExitedError if cancelling => {
                SubprocStatus::Cancelled
            }
            ProcessStatus::ExitedOk => SubprocStatus::CompleteSuccess,
            ProcessStatus::ExitedError => SubprocStatus::CompleteFailure,
            ProcessStatus::LaunchFailed => SubprocStatus::LaunchFailed,
            ProcessStatus::Unknown => {
                self.error_message = SUBPROC_ERROR_MESSAGE;
                SubprocStatus::Error
            }
        };

        tracing::debug!(
            program = ?self.command_line.first(),
            from = ?self.status,
            to = ?next,
            "subprocess routine finished"
        );
        self.status = next;
        self.process = None;
    }

    fn calculate_progress_percent(&mut self) {
        match self.status {
            SubprocStatus::CompleteSuccess | SubprocStatus::CompleteFailure => {
                self.last_progress_percent = PROGRESS_PERCENT_COMPLETE;
            }
            SubprocStatus::Running => {
                if let (Some(predicted), Some(start)) =
                    (self.predicted_duration_secs, self.start_time)
                {
                    let elapsed_ms = (self.timestamp_provider.now() - start)
                        .num_milliseconds()
                        .max(0) as u64;
                    let percent = elapsed_ms * 100 / (u64::from(predicted) * 1000);
                    self.last_progress_percent =
                        percent.min(u64::from(PROGRESS_PERCENT_COMPLETE)) as u32;
                }
            }
            _ => {}
        }
    }

    fn status_message(&self) -> &'static str {
        match self.status {
            SubprocStatus::Ready => SUBPROC_READY_MESSAGE,
            SubprocStatus::LaunchFailed => SUBPROC_FAILED_TO_LAUNCH_MESSAGE,
            SubprocStatus::Running => SUBPROC_RUNNING_MESSAGE,
            SubprocStatus::Cancelling => SUBPROC_CANCELLING_MESSAGE,
            SubprocStatus::CompleteSuccess => SUBPROC_SUCCEEDED_MESSAGE,
            SubprocStatus::CompleteFailure => SUBPROC_FAILED_MESSAGE,
            SubprocStatus::Error => self.error_message,
            SubprocStatus::Cancelled => SUBPROC_CANCELLED_MESSAGE,
        }
    }
}

impl Routine for SubprocRoutine {
    fn start(&mut self) {
        if self.status != SubprocStatus::Ready {
            tracing::warn!(status = ?self.status, "subprocess routine started twice, ignoring");
            return;
        }

        match self.adapter.start(&self.command_line) {
            Ok(process) => {
                tracing::info!(
                    command_line = ?self.command_line,
                    pid = ?process.pid(),
                    "started subprocess routine"
                );
                self.process = Some(process);
                self.start_time = Some(self.timestamp_provider.now());
                self.status = SubprocStatus::Running;
            }
            Err(e) => {
                tracing::error!(
                    command_line = ?self.command_line,
                    error = %e,
                    "failed to launch subprocess routine"
                );
                self.status = SubprocStatus::LaunchFailed;
                self.last_progress_percent = PROGRESS_PERCENT_UNKNOWN;
            }
        }
    }

    fn resume(&mut self) {
        tracing::debug!(status = ?self.status, "subprocess routines cannot be resumed");
    }

    fn cancel(&mut self) {
        self.check_process_status();
        if self.status != SubprocStatus::Running {
            return;
        }
        let Some(process) = self.process.as_mut() else {
            return;
        };

        match process.kill() {
            Ok(()) => {
                tracing::info!(pid = ?process.pid(), "cancelling subprocess routine");
                self.status = SubprocStatus::Cancelling;
            }
            Err(e) => {
                tracing::error!(
                    pid = ?process.pid(),
                    error = %e,
                    "failed to cancel subprocess routine"
                );
                self.error_message = SUBPROC_FAILED_TO_STOP_MESSAGE;
                self.status = SubprocStatus::Error;
            }
        }
    }

    fn status(&mut self) -> RoutineStatus {
        self.check_process_status();
        self.status.to_routine_status()
    }

    fn populate_status_update(&mut self, _include_output: bool) -> RoutineSnapshot {
        self.check_process_status();
        self.calculate_progress_percent();

        RoutineSnapshot::builder(self.status.to_routine_status(), self.status_message())
            .progress_percent(self.last_progress_percent)
            .build()
    }
}
