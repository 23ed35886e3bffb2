// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::routines as rt;
use rt::error::DiagError;
use rt::routine::{Routine, RoutineSnapshot, PROGRESS_PERCENT_COMPLETE};
use rt::{sysfs, BatteryHealthParameters, RoutineStatus};

pub const BATTERY_HEALTH_READY_MESSAGE: &str = "Battery health routine ready.";
pub const BATTERY_HEALTH_PASSED_MESSAGE: &str = "Battery health routine passed.";
pub const BATTERY_HEALTH_EXCESSIVE_WEAR_MESSAGE: &str = "Battery is over-worn.";
pub const BATTERY_HEALTH_EXCESSIVE_CYCLE_COUNT_MESSAGE: &str = "Battery cycle count is too high.";
pub const BATTERY_HEALTH_FAILED_CALCULATING_WEAR_MESSAGE: &str =
    "Could not get wear percentage.";
pub const BATTERY_HEALTH_FAILED_READING_CYCLE_COUNT_MESSAGE: &str = "Could not get cycle count.";

/// Attributes copied into the output log when present.
pub const BATTERY_HEALTH_LOGGED_ATTRIBUTES: [&str; 8] = [
    "manufacturer",
    "model_name",
    "present",
    "status",
    "voltage_now",
    "voltage_min_design",
    "current_now",
    "charge_now",
];

const CHARGE_FULL: &str = "charge_full";
const CHARGE_FULL_DESIGN: &str = "charge_full_design";
const ENERGY_FULL: &str = "energy_full";
const ENERGY_FULL_DESIGN: &str = "energy_full_design";
const CYCLE_COUNT: &str = "cycle_count";

/// Checks battery wear and cycle count against maximum allowed values.
pub struct BatteryHealthRoutine {
    battery_dir: PathBuf,
    maximum_cycle_count: u32,
    percent_battery_wear_allowed: u32,
    status: RoutineStatus,
    status_message: &'static str,
    output: String,
}

impl BatteryHealthRoutine {
    pub fn new(sysfs_root: &Path, params: &BatteryHealthParameters) -> Self {
        BatteryHealthRoutine {
            battery_dir: sysfs_root.join(sysfs::BATTERY_DIR),
            maximum_cycle_count: params.maximum_cycle_count,
            percent_battery_wear_allowed: params.percent_battery_wear_allowed,
            status: RoutineStatus::Ready,
            status_message: BATTERY_HEALTH_READY_MESSAGE,
            output: String::new(),
        }
    }

    fn log_value(&mut self, key: &str, value: impl std::fmt::Display) {
        // writing into a String never fails
        let _ = writeln!(self.output, "{}: {}", key, value);
    }

    fn log_attributes(&mut self) {
        for attribute in BATTERY_HEALTH_LOGGED_ATTRIBUTES {
            match sysfs::read_trimmed(self.battery_dir.join(attribute)) {
                Ok(value) => self.log_value(attribute, value),
                Err(e) => tracing::debug!(error = %e, "skipping battery attribute"),
            }
        }
    }

    /// Reads full and design capacity, from charge values if available and
    /// energy values otherwise.
    fn read_capacities(&self) -> Result<(u64, u64), DiagError> {
        let charge = sysfs::read_integer::<u64, _>(self.battery_dir.join(CHARGE_FULL)).and_then(
            |full| Ok((full, sysfs::read_integer(self.battery_dir.join(CHARGE_FULL_DESIGN))?)),
        );
        if charge.is_ok() {
            return charge;
        }

        let full = sysfs::read_integer(self.battery_dir.join(ENERGY_FULL))?;
        let design = sysfs::read_integer(self.battery_dir.join(ENERGY_FULL_DESIGN))?;
        Ok((full, design))
    }

    fn test_wear_percentage(&mut self) -> Result<bool, DiagError> {
        let (full, design) = self.read_capacities()?;
        if design == 0 {
            return Err(DiagError::ZeroDesignCapacity(self.battery_dir.clone()));
        }

        let scaled_full = full
            .checked_mul(100)
            .ok_or_else(|| DiagError::CapacityOutOfRange(self.battery_dir.clone()))?;
        // capacity can exceed design on new batteries
        let wear_percentage = 100u64.saturating_sub(scaled_full / design);
        self.log_value("wear_percentage", wear_percentage);

        Ok(wear_percentage <= u64::from(self.percent_battery_wear_allowed))
    }

    fn test_cycle_count(&mut self) -> Result<bool, DiagError> {
        let cycle_count: u32 = sysfs::read_integer(self.battery_dir.join(CYCLE_COUNT))?;
        self.log_value(CYCLE_COUNT, cycle_count);

        Ok(cycle_count <= self.maximum_cycle_count)
    }

    fn run_checks(&mut self) -> (RoutineStatus, &'static str) {
        self.log_attributes();

        let wear_ok = match self.test_wear_percentage() {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!(error = %e, "failed to calculate battery wear");
                return (RoutineStatus::Error, BATTERY_HEALTH_FAILED_CALCULATING_WEAR_MESSAGE);
            }
        };

        let cycle_count_ok = match self.test_cycle_count() {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!(error = %e, "failed to read battery cycle count");
                return (RoutineStatus::Error, BATTERY_HEALTH_FAILED_READING_CYCLE_COUNT_MESSAGE);
            }
        };

        if !wear_ok {
            (RoutineStatus::Failed, BATTERY_HEALTH_EXCESSIVE_WEAR_MESSAGE)
        } else if !cycle_count_ok {
            (RoutineStatus::Failed, BATTERY_HEALTH_EXCESSIVE_CYCLE_COUNT_MESSAGE)
        } else {
            (RoutineStatus::Passed, BATTERY_HEALTH_PASSED_MESSAGE)
        }
    }
}

impl Routine for BatteryHealthRoutine {
    fn start(&mut self) {
        if self.status != RoutineStatus::Ready {
            tracing::warn!(status = ?self.status, "battery health routine started twice, ignoring");
            return;
        }

        (self.status, self.status_message) = self.run_checks();
        tracing::info!(status = ?self.status, "battery health routine finished");
    }

    fn resume(&mut self) {}

    fn cancel(&mut self) {}

    fn status(&mut self) -> RoutineStatus {
        self.status
    }

    fn populate_status_update(&mut self, include_output: bool) -> RoutineSnapshot {
        let progress = if self.status.is_terminal() {
            PROGRESS_PERCENT_COMPLETE
        } else {
            0
        };

        RoutineSnapshot::builder(self.status, self.status_message)
            .progress_percent(progress)
            .output(include_output, self.output.as_bytes())
            .build()
    }
}
