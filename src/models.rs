// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::Deserialize;
use serde::Serialize;
use serde_with::base64::Base64;
use serde_with::serde_as;

/// Opaque identifier handed out by the registry for every started routine.
pub type RoutineId = u32;

/// Id reported for run requests that never produced a routine.
pub const INVALID_ROUTINE_ID: RoutineId = 0;

/// Categories of diagnostic routines that a device may support.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RoutineKind {
    #[serde(rename = "BATTERY_CAPACITY")]
    BatteryCapacity,
    #[serde(rename = "BATTERY_HEALTH")]
    BatteryHealth,
    #[serde(rename = "AC_POWER")]
    AcPower,
    #[serde(rename = "STORAGE_SELF_TEST")]
    StorageSelfTest,
    #[serde(rename = "RANDOMNESS_SOAK")]
    RandomnessSoak,
}

/// Externally visible status of a routine.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoutineStatus {
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "WAITING")]
    Waiting,
    #[serde(rename = "PASSED")]
    Passed,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "CANCELLING")]
    Cancelling,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    #[serde(rename = "FAILED_TO_START")]
    FailedToStart,
    #[serde(rename = "REMOVED")]
    Removed,
}

impl RoutineStatus {
    /// Whether the routine has finished and will never change status again
    /// (short of being removed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RoutineStatus::Passed
                | RoutineStatus::Failed
                | RoutineStatus::Error
                | RoutineStatus::Cancelled
                | RoutineStatus::FailedToStart
        )
    }
}

/// Instruction shown to the user while an interactive routine is waiting.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    #[serde(rename = "PLUG_IN_AC_POWER")]
    PlugInAcPower,
    #[serde(rename = "UNPLUG_AC_POWER")]
    UnplugAcPower,
}

/// Commands accepted by an already-running routine.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    #[serde(rename = "RESUME")]
    Resume,
    #[serde(rename = "CANCEL")]
    Cancel,
    #[serde(rename = "GET_STATUS")]
    GetStatus,
    #[serde(rename = "REMOVE")]
    Remove,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct BatteryCapacityParameters {
    #[serde(rename = "lowMah")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_mah: Option<u32>,

    #[serde(rename = "highMah")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_mah: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BatteryHealthParameters {
    #[serde(rename = "maximumCycleCount")]
    pub maximum_cycle_count: u32,

    #[serde(rename = "percentBatteryWearAllowed")]
    pub percent_battery_wear_allowed: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AcPowerParameters {
    #[serde(rename = "expectedConnected")]
    pub expected_connected: bool,

    #[serde(rename = "expectedPowerType")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_power_type: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct StorageSelfTestParameters {}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RandomnessSoakParameters {
    #[serde(rename = "lengthSeconds")]
    pub length_seconds: u32,
}

/// A routine kind together with the typed parameters it runs with.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum RoutineParameters {
    #[serde(rename = "batteryCapacity")]
    BatteryCapacity(BatteryCapacityParameters),
    #[serde(rename = "batteryHealth")]
    BatteryHealth(BatteryHealthParameters),
    #[serde(rename = "acPower")]
    AcPower(AcPowerParameters),
    #[serde(rename = "storageSelfTest")]
    StorageSelfTest(StorageSelfTestParameters),
    #[serde(rename = "randomnessSoak")]
    RandomnessSoak(RandomnessSoakParameters),
}

impl RoutineParameters {
    pub fn kind(&self) -> RoutineKind {
        match self {
            RoutineParameters::BatteryCapacity(_) => RoutineKind::BatteryCapacity,
            RoutineParameters::BatteryHealth(_) => RoutineKind::BatteryHealth,
            RoutineParameters::AcPower(_) => RoutineKind::AcPower,
            RoutineParameters::StorageSelfTest(_) => RoutineKind::StorageSelfTest,
            RoutineParameters::RandomnessSoak(_) => RoutineKind::RandomnessSoak,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GetAvailableRoutinesResponse {
    #[serde(rename = "routines")]
    pub routines: Vec<RoutineKind>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RunRoutineRequest {
    #[serde(rename = "routine")]
    #[serde(default)]
    pub routine: Option<RoutineParameters>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RunRoutineResponse {
    #[serde(rename = "id")]
    pub id: RoutineId,

    #[serde(rename = "status")]
    pub status: RoutineStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GetRoutineUpdateRequest {
    #[serde(rename = "id")]
    pub id: RoutineId,

    #[serde(rename = "command")]
    #[serde(default)]
    pub command: Option<Command>,

    #[serde(rename = "includeOutput")]
    #[serde(default)]
    pub include_output: bool,
}

/// Point-in-time view of a routine, derived on demand from its live state.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoutineUpdate {
    #[serde(rename = "id")]
    pub id: RoutineId,

    #[serde(rename = "status")]
    pub status: RoutineStatus,

    #[serde(rename = "statusMessage")]
    pub status_message: String,

    #[serde(rename = "progressPercent")]
    pub progress_percent: u32,

    #[serde_as(as = "Option<Base64>")]
    #[serde(rename = "output")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<u8>>,

    #[serde(rename = "userMessage")]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub user_message: Option<UserMessage>,
}
