// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;

use crate::routines as rt;
use rt::error::DiagError;
use rt::routine::{Routine, RoutineSnapshot, PROGRESS_PERCENT_COMPLETE};
use rt::{sysfs, BatteryCapacityParameters, RoutineStatus};

pub const DEFAULT_LOW_MAH: u32 = 1000;
pub const DEFAULT_HIGH_MAH: u32 = 10000;

pub const BATTERY_CAPACITY_READY_MESSAGE: &str = "Battery capacity routine ready.";
pub const BATTERY_CAPACITY_PASSED_MESSAGE: &str = "Battery design capacity within given limits.";
pub const BATTERY_CAPACITY_FAILED_MESSAGE: &str =
    "Battery design capacity not within given limits.";
pub const BATTERY_CAPACITY_INVALID_PARAMETERS_MESSAGE: &str =
    "Invalid battery capacity routine parameters.";
pub const BATTERY_CAPACITY_READ_FAILED_MESSAGE: &str = "Failed to read battery design capacity.";

const CHARGE_FULL_DESIGN: &str = "charge_full_design";

/// Checks that the battery's design capacity lies within a given range.
///
/// The whole check runs synchronously in [`Routine::start`].
pub struct BatteryCapacityRoutine {
    battery_dir: PathBuf,
    low_mah: u32,
    high_mah: u32,
    status: RoutineStatus,
    status_message: &'static str,
}

impl BatteryCapacityRoutine {
    pub fn new(sysfs_root: &std::path::Path, params: &BatteryCapacityParameters) -> Self {
        BatteryCapacityRoutine {
            battery_dir: sysfs_root.join(sysfs::BATTERY_DIR),
            low_mah: params.low_mah.unwrap_or(DEFAULT_LOW_MAH),
            high_mah: params.high_mah.unwrap_or(DEFAULT_HIGH_MAH),
            status: RoutineStatus::Ready,
            status_message: BATTERY_CAPACITY_READY_MESSAGE,
        }
    }

    fn run_check(&self) -> Result<bool, DiagError> {
        if self.low_mah > self.high_mah {
            return Err(DiagError::InvalidParameters(format!(
                "low bound {} mAh exceeds high bound {} mAh",
                self.low_mah, self.high_mah
            )));
        }

        // the kernel reports µAh
        let design_uah: u64 =
            sysfs::read_integer(self.battery_dir.join(CHARGE_FULL_DESIGN))?;
        let design_mah = design_uah / 1000;
        tracing::debug!(
            design_mah,
            low = self.low_mah,
            high = self.high_mah,
            "battery design capacity"
        );

        Ok(u64::from(self.low_mah) <= design_mah && design_mah <= u64::from(self.high_mah))
    }
}

impl Routine for BatteryCapacityRoutine {
    fn start(&mut self) {
        if self.status != RoutineStatus::Ready {
            tracing::warn!(
                status = ?self.status,
                "battery capacity routine started twice, ignoring"
            );
            return;
        }

        (self.status, self.status_message) = match self.run_check() {
            Ok(true) => (RoutineStatus::Passed, BATTERY_CAPACITY_PASSED_MESSAGE),
            Ok(false) => (RoutineStatus::Failed, BATTERY_CAPACITY_FAILED_MESSAGE),
            Err(e @ DiagError::InvalidParameters(_)) => {
                tracing::error!(error = %e, "battery capacity routine not run");
                (RoutineStatus::Error, BATTERY_CAPACITY_INVALID_PARAMETERS_MESSAGE)
            }
            Err(e) => {
                tracing::error!(error = %e, "battery capacity routine failed to read sysfs");
                (RoutineStatus::Error, BATTERY_CAPACITY_READ_FAILED_MESSAGE)
            }
        };
    }

    fn resume(&mut self) {}

    fn cancel(&mut self) {}

    fn status(&mut self) -> RoutineStatus {
        self.status
    }

    fn populate_status_update(&mut self, _include_output: bool) -> RoutineSnapshot {
        let progress = if self.status.is_terminal() {
            PROGRESS_PERCENT_COMPLETE
        } else {
            0
        };

        RoutineSnapshot::builder(self.status, self.status_message)
            .progress_percent(progress)
            .build()
    }
}
