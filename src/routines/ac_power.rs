// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::{Path, PathBuf};

use crate::routines as rt;
use rt::error::DiagError;
use rt::routine::{
    Routine, RoutineSnapshot, PROGRESS_PERCENT_COMPLETE, PROGRESS_PERCENT_STARTED,
};
use rt::{sysfs, AcPowerParameters, RoutineStatus, UserMessage};

pub const AC_POWER_READY_MESSAGE: &str = "AC power routine ready.";
pub const AC_POWER_WAITING_MESSAGE: &str = "Waiting for the AC power supply to be (dis)connected.";
pub const AC_POWER_PASSED_MESSAGE: &str = "AC power routine passed.";
pub const AC_POWER_CANCELLED_MESSAGE: &str = "AC power routine cancelled.";
pub const AC_POWER_NOT_ONLINE_MESSAGE: &str =
    "Expected online power supply, found offline power supply.";
pub const AC_POWER_NOT_OFFLINE_MESSAGE: &str =
    "Expected offline power supply, found online power supply.";
pub const AC_POWER_INCORRECT_TYPE_MESSAGE: &str =
    "Read power type different from expected power type.";
pub const AC_POWER_NO_VALID_POWER_SUPPLY_MESSAGE: &str = "No valid AC power supply found.";
pub const AC_POWER_READ_FAILED_MESSAGE: &str = "Could not read power supply attributes.";

const BATTERY_TYPE: &str = "Battery";

struct PowerSupply {
    dir: PathBuf,
    online: bool,
}

/// Asks the user to plug or unplug the charger, then checks that the kernel
/// agrees.
pub struct AcPowerRoutine {
    power_supply_dir: PathBuf,
    expected_connected: bool,
    expected_power_type: Option<String>,
    status: RoutineStatus,
    status_message: &'static str,
    progress_percent: u32,
}

impl AcPowerRoutine {
    pub fn new(sysfs_root: &Path, params: &AcPowerParameters) -> Self {
        AcPowerRoutine {
            power_supply_dir: sysfs_root.join(sysfs::POWER_SUPPLY_DIR),
            expected_connected: params.expected_connected,
            expected_power_type: params.expected_power_type.clone(),
            status: RoutineStatus::Ready,
            status_message: AC_POWER_READY_MESSAGE,
            progress_percent: 0,
        }
    }

    fn user_message(&self) -> UserMessage {
        if self.expected_connected {
            UserMessage::PlugInAcPower
        } else {
            UserMessage::UnplugAcPower
        }
    }

    fn is_battery(dir: &Path) -> bool {
        sysfs::read_trimmed(dir.join("type"))
            .map(|kind| kind == BATTERY_TYPE)
            .unwrap_or(false)
    }

    /// Picks the supply to check: the first online one, or failing that the
    /// first one whose online flag could be read at all.
    fn find_power_supply(&self) -> Result<PowerSupply, DiagError> {
        let mut fallback = None;

        for dir in sysfs::sorted_entries(&self.power_supply_dir)? {
            if Self::is_battery(&dir) {
                continue;
            }

            let online = match sysfs::read_integer::<u32, _>(dir.join("online")) {
                Ok(value) => value != 0,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping power supply");
                    continue;
                }
            };

            if online {
                return Ok(PowerSupply { dir, online });
            }
            if fallback.is_none() {
                fallback = Some(PowerSupply { dir, online });
            }
        }

        fallback.ok_or(DiagError::NoPowerSupply)
    }

    fn run_check(&self) -> Result<(RoutineStatus, &'static str), DiagError> {
        let supply = self.find_power_supply()?;
        tracing::debug!(
            dir = %supply.dir.display(),
            online = supply.online,
            "checking power supply"
        );

        if supply.online != self.expected_connected {
            let message = if self.expected_connected {
                AC_POWER_NOT_ONLINE_MESSAGE
            } else {
                AC_POWER_NOT_OFFLINE_MESSAGE
            };
            return Ok((RoutineStatus::Failed, message));
        }

        if let Some(expected) = &self.expected_power_type {
            let actual = sysfs::read_trimmed(supply.dir.join("type"))?;
            if &actual != expected {
                tracing::info!(%actual, %expected, "power supply type mismatch");
                return Ok((RoutineStatus::Failed, AC_POWER_INCORRECT_TYPE_MESSAGE));
            }
        }

        Ok((RoutineStatus::Passed, AC_POWER_PASSED_MESSAGE))
    }
}

impl Routine for AcPowerRoutine {
    fn start(&mut self) {
        if self.status != RoutineStatus::Ready {
            tracing::warn!(status = ?self.status, "AC power routine started twice, ignoring");
            return;
        }

        self.status = RoutineStatus::Waiting;
        self.status_message = AC_POWER_WAITING_MESSAGE;
        self.progress_percent = PROGRESS_PERCENT_STARTED;
    }

    fn resume(&mut self) {
        if self.status != RoutineStatus::Waiting {
            tracing::warn!(status = ?self.status, "AC power routine resumed while not waiting");
            return;
        }

        match self.run_check() {
            Ok((status, message)) => {
                self.status = status;
                self.status_message = message;
                self.progress_percent = PROGRESS_PERCENT_COMPLETE;
            }
            Err(e) => {
                // progress stays at the waiting value
                tracing::error!(error = %e, "AC power routine could not read power supplies");
                self.status = RoutineStatus::Error;
                self.status_message = match e {
                    DiagError::NoPowerSupply => AC_POWER_NO_VALID_POWER_SUPPLY_MESSAGE,
                    _ => AC_POWER_READ_FAILED_MESSAGE,
                };
            }
        }
    }

    fn cancel(&mut self) {
        if self.status != RoutineStatus::Waiting {
            return;
        }

        self.status = RoutineStatus::Cancelled;
        self.status_message = AC_POWER_CANCELLED_MESSAGE;
    }

    fn status(&mut self) -> RoutineStatus {
        self.status
    }

    fn populate_status_update(&mut self, _include_output: bool) -> RoutineSnapshot {
        let mut builder = RoutineSnapshot::builder(self.status, self.status_message)
            .progress_percent(self.progress_percent);
        if self.status == RoutineStatus::Waiting {
            builder = builder.user_message(self.user_message());
        }
        builder.build()
    }
}
