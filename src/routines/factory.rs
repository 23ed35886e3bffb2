// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;

use crate::routines as rt;
use rt::ac_power::AcPowerRoutine;
use rt::battery::BatteryCapacityRoutine;
use rt::battery_health::BatteryHealthRoutine;
use rt::config::Config;
use rt::routine::Routine;
use rt::subproc::SubprocRoutine;
use rt::RoutineParameters;

/// Builds routines from run requests.
///
/// Returning `None` tells the registry that no routine could be created for
/// the request; it is reported to the caller as a routine that failed to
/// start.
pub trait RoutineFactory {
    fn create(&self, params: &RoutineParameters) -> Option<Box<dyn Routine + Send + 'static>>;
}

/// Factory producing the real routines for this device.
pub struct DefaultRoutineFactory {
    config: Arc<Config>,
}

impl DefaultRoutineFactory {
    pub fn new(config: Arc<Config>) -> Self {
        DefaultRoutineFactory { config }
    }

    fn storage_self_test_command(&self) -> Vec<String> {
        vec![self.config.smartctl_check_path.display().to_string()]
    }

    fn randomness_soak_command(&self, length_seconds: u32) -> Vec<String> {
        vec![
            self.config.urandom_path.display().to_string(),
            format!("--time_delta_ms={}", u64::from(length_seconds) * 1000),
        ]
    }
}

impl RoutineFactory for DefaultRoutineFactory {
    fn create(&self, params: &RoutineParameters) -> Option<Box<dyn Routine + Send + 'static>> {
        let root = self.config.sysfs_root();

        let routine: Box<dyn Routine + Send + 'static> = match params {
            RoutineParameters::BatteryCapacity(p) => Box::new(BatteryCapacityRoutine::new(root, p)),
            RoutineParameters::BatteryHealth(p) => Box::new(BatteryHealthRoutine::new(root, p)),
            RoutineParameters::AcPower(p) => Box::new(AcPowerRoutine::new(root, p)),
            RoutineParameters::StorageSelfTest(_) => Box::new(SubprocRoutine::new(
                &self.config,
                self.storage_self_test_command(),
                None,
            )),
            RoutineParameters::RandomnessSoak(p) => Box::new(SubprocRoutine::new(
                &self.config,
                self.randomness_soak_command(p.length_seconds),
                Some(p.length_seconds),
            )),
        };

        Some(routine)
    }
}
