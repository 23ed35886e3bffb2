// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::routines as rt;
use rt::registry::Registry;
use rt::{
    GetAvailableRoutinesResponse, GetRoutineUpdateRequest, RoutineStatus, RoutineUpdate,
    RunRoutineRequest, RunRoutineResponse, INVALID_ROUTINE_ID,
};

pub const NO_COMMAND_SPECIFIED_MESSAGE: &str = "No command specified.";

/// Request facing entry point of the routine engine.
///
/// Cloning the service yields another handle to the same registry; all calls
/// are funneled through a single lock, so operations on one routine are
/// applied in the order they arrive.
#[derive(Clone)]
pub struct RoutineService {
    registry: Arc<Mutex<Registry>>,
}

impl RoutineService {
    /// Creates a new [`RoutineService`] owning the given registry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use diagd::routines::*;
    ///
    /// let config = Config::builder()
    ///     .available_routines(&[RoutineKind::BatteryCapacity])
    ///     .build();
    /// let service = RoutineService::new(Registry::new(config));
    /// ```
    pub fn new(registry: Registry) -> Self {
        RoutineService {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    /// Lists the routine kinds this device supports.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # tokio_test::block_on(async {
    /// # use diagd::routines::*;
    ///
    /// let config = Config::builder()
    ///     .available_routines(&[RoutineKind::AcPower])
    ///     .build();
    /// let service = RoutineService::new(Registry::new(config));
    ///
    /// let response = service.get_available_routines().await;
    /// assert_eq!(response.routines, vec![RoutineKind::AcPower]);
    /// # });
    /// ```
    pub async fn get_available_routines(&self) -> GetAvailableRoutinesResponse {
        GetAvailableRoutinesResponse {
            routines: self.registry.lock().await.available_routines().to_vec(),
        }
    }

    /// Starts a new routine. Requests without parameters are rejected with a
    /// `FailedToStart` status and the invalid id.
    pub async fn run_routine(&self, request: RunRoutineRequest) -> RunRoutineResponse {
        let Some(params) = request.routine else {
            tracing::error!("run routine request without routine parameters");
            return RunRoutineResponse {
                id: INVALID_ROUTINE_ID,
                status: RoutineStatus::FailedToStart,
            };
        };

        self.registry.lock().await.run(&params)
    }

    /// Sends a command to an existing routine and reports its state.
    pub async fn get_routine_update(&self, request: GetRoutineUpdateRequest) -> RoutineUpdate {
        let Some(command) = request.command else {
            tracing::error!(id = request.id, "routine update request without command");
            return RoutineUpdate {
                id: request.id,
                status: RoutineStatus::Error,
                status_message: NO_COMMAND_SPECIFIED_MESSAGE.to_owned(),
                progress_percent: 0,
                output: None,
                user_message: None,
            };
        };

        self.registry
            .lock()
            .await
            .update(request.id, command, request.include_output)
    }
}
