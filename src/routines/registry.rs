// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashMap;
use std::sync::Arc;

use crate::routines as rt;
use rt::config::Config;
use rt::factory::{DefaultRoutineFactory, RoutineFactory};
use rt::routine::Routine;
use rt::{
    sysfs, Command, RoutineId, RoutineKind, RoutineParameters, RoutineStatus, RoutineUpdate,
    RunRoutineResponse, INVALID_ROUTINE_ID,
};

pub const ROUTINE_DOES_NOT_EXIST_MESSAGE: &str = "Specified routine does not exist.";

/// Exclusive owner of every active routine, keyed by the id handed out when
/// the routine was run.
///
/// Removing a routine, or dropping the registry, destroys the routine and
/// with it any child process it still owns.
pub struct Registry {
    factory: Box<dyn RoutineFactory + Send + Sync + 'static>,
    available_routines: Vec<RoutineKind>,
    routines: HashMap<RoutineId, Box<dyn Routine + Send + 'static>>,
    next_id: RoutineId,
}

impl Registry {
    /// Creates a registry using the real routine factory.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let available_routines = config
            .available_routines
            .clone()
            .unwrap_or_else(|| probe_available_routines(&config));

        Registry::with_factory(
            Box::new(DefaultRoutineFactory::new(config)),
            available_routines,
        )
    }

    /// Creates a registry around a custom factory, e.g. one producing fakes.
    pub fn with_factory(
        factory: Box<dyn RoutineFactory + Send + Sync + 'static>,
        available_routines: Vec<RoutineKind>,
    ) -> Self {
        Registry {
            factory,
            available_routines,
            routines: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn available_routines(&self) -> &[RoutineKind] {
        &self.available_routines
    }

    /// Number of routines currently owned by the registry.
    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Creates and starts a routine, returning its id and initial status.
    pub fn run(&mut self, params: &RoutineParameters) -> RunRoutineResponse {
        let Some(mut routine) = self.factory.create(params) else {
            tracing::error!(kind = ?params.kind(), "no routine could be created");
            return RunRoutineResponse {
                id: INVALID_ROUTINE_ID,
                status: RoutineStatus::FailedToStart,
            };
        };

        routine.start();

        let id = self.next_id;
        self.next_id += 1;

        let status = routine.status();
        tracing::info!(id, kind = ?params.kind(), ?status, "routine started");
        self.routines.insert(id, routine);

        RunRoutineResponse { id, status }
    }

    /// Applies `command` to the routine with the given id and returns a
    /// snapshot of it.
    pub fn update(
        &mut self,
        id: RoutineId,
        command: Command,
        include_output: bool,
    ) -> RoutineUpdate {
        let Some(routine) = self.routines.get_mut(&id) else {
            tracing::warn!(id, ?command, "update for unknown routine");
            return RoutineUpdate {
                id,
                status: RoutineStatus::Error,
                status_message: ROUTINE_DOES_NOT_EXIST_MESSAGE.to_owned(),
                progress_percent: 0,
                output: None,
                user_message: None,
            };
        };

        match command {
            Command::Resume => routine.resume(),
            Command::Cancel => routine.cancel(),
            Command::GetStatus => {}
            Command::Remove => {
                let mut update = routine.populate_status_update(include_output).into_update(id);
                update.status = RoutineStatus::Removed;
                if let Some(routine) = self.routines.remove(&id) {
                    tear_down(routine);
                }
                tracing::info!(id, "routine removed");
                return update;
            }
        }

        routine.populate_status_update(include_output).into_update(id)
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        if !self.routines.is_empty() {
            tracing::debug!(count = self.routines.len(), "tearing down remaining routines");
        }
        for (_, routine) in self.routines.drain() {
            tear_down(routine);
        }
    }
}

/// Cancels a routine that is still active before it is dropped. Dropping
/// kills any child process that outlives the cancellation.
fn tear_down(mut routine: Box<dyn Routine + Send + 'static>) {
    if !routine.status().is_terminal() {
        routine.cancel();
    }
}

/// Works out which routines can run on this device from what the kernel and
/// the filesystem expose.
fn probe_available_routines(config: &Config) -> Vec<RoutineKind> {
    let root = config.sysfs_root();
    let mut kinds = Vec::new();

    if root.join(sysfs::BATTERY_DIR).is_dir() {
        kinds.push(RoutineKind::BatteryCapacity);
        kinds.push(RoutineKind::BatteryHealth);
    }
    if root.join(sysfs::POWER_SUPPLY_DIR).is_dir() {
        kinds.push(RoutineKind::AcPower);
    }
    if config.smartctl_check_path.is_file() {
        kinds.push(RoutineKind::StorageSelfTest);
    }
    if config.urandom_path.is_file() {
        kinds.push(RoutineKind::RandomnessSoak);
    }

    tracing::debug!(?kinds, "probed available routines");
    kinds
}
