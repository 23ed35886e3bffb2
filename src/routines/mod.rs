// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

mod ac_power;
mod battery;
mod battery_health;
mod config;
mod error;
mod factory;
mod process;
mod registry;
mod routine;
mod service;
mod subproc;
mod sysfs;

pub use ac_power::*;
pub use battery::*;
pub use battery_health::*;
pub use config::*;
pub use error::*;
pub use factory::*;
pub use process::*;
pub use registry::*;
pub use routine::*;
pub use service::*;
pub use subproc::*;
pub use sysfs::{read_integer, read_trimmed, BATTERY_DIR, POWER_SUPPLY_DIR};

pub use crate::models::{
    AcPowerParameters, BatteryCapacityParameters, BatteryHealthParameters, Command,
    GetAvailableRoutinesResponse, GetRoutineUpdateRequest, RandomnessSoakParameters, RoutineId,
    RoutineKind, RoutineParameters, RoutineStatus, RoutineUpdate, RunRoutineRequest,
    RunRoutineResponse, StorageSelfTestParameters, UserMessage, INVALID_ROUTINE_ID,
};
