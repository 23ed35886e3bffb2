// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::routines as rt;
use rt::{RoutineId, RoutineStatus, RoutineUpdate, UserMessage};

/// Progress reported by an interactive routine once it is waiting on the user.
pub const PROGRESS_PERCENT_STARTED: u32 = 33;

/// Progress reported by a subprocess routine with no duration estimate.
pub const PROGRESS_PERCENT_UNKNOWN: u32 = 33;

pub const PROGRESS_PERCENT_COMPLETE: u32 = 100;

/// A single diagnostic routine instance and its state machine.
///
/// Routines are driven exclusively by the registry that owns them. Every
/// method returns promptly; long running work happens in a child process
/// that is observed by polling.
pub trait Routine {
    /// Starts the routine. Called exactly once, while the routine is ready.
    fn start(&mut self);

    /// Resumes a routine waiting on user interaction. A no-op in any other
    /// state.
    fn resume(&mut self);

    /// Cancels a running or waiting routine.
    fn cancel(&mut self);

    /// Returns the current status, reconciling it with any child process
    /// first.
    fn status(&mut self) -> RoutineStatus;

    /// Builds a snapshot of the routine. The output payload is only filled in
    /// when `include_output` is set.
    fn populate_status_update(&mut self, include_output: bool) -> RoutineSnapshot;
}

/// The view of a routine at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineSnapshot {
    pub status: RoutineStatus,
    pub status_message: String,
    pub progress_percent: u32,
    pub output: Option<Vec<u8>>,
    pub user_message: Option<UserMessage>,
}

impl RoutineSnapshot {
    pub fn builder(status: RoutineStatus, status_message: &str) -> RoutineSnapshotBuilder {
        RoutineSnapshotBuilder::new(status, status_message)
    }

    /// Attaches the registry id, producing the caller facing response.
    pub fn into_update(self, id: RoutineId) -> RoutineUpdate {
        RoutineUpdate {
            id,
            status: self.status,
            status_message: self.status_message,
            progress_percent: self.progress_percent,
            output: self.output,
            user_message: self.user_message,
        }
    }
}

#[derive(Debug)]
pub struct RoutineSnapshotBuilder {
    status: RoutineStatus,
    status_message: String,
    progress_percent: u32,
    output: Option<Vec<u8>>,
    user_message: Option<UserMessage>,
}

impl RoutineSnapshotBuilder {
    fn new(status: RoutineStatus, status_message: &str) -> Self {
        RoutineSnapshotBuilder {
            status,
            status_message: status_message.to_owned(),
            progress_percent: 0,
            output: None,
            user_message: None,
        }
    }

    pub fn progress_percent(mut self, value: u32) -> Self {
        self.progress_percent = value.min(PROGRESS_PERCENT_COMPLETE);
        self
    }

    /// Sets the output payload; ignored unless `include` is set, so callers
    /// can pass their request flag through unchanged.
    pub fn output(mut self, include: bool, value: &[u8]) -> Self {
        if include {
            self.output = Some(value.to_vec());
        }
        self
    }

    pub fn user_message(mut self, value: UserMessage) -> Self {
        self.user_message = Some(value);
        self
    }

    pub fn build(self) -> RoutineSnapshot {
        RoutineSnapshot {
            status: self.status,
            status_message: self.status_message,
            progress_percent: self.progress_percent,
            output: self.output,
            user_message: self.user_message,
        }
    }
}
