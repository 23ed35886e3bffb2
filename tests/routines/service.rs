// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anyhow::Result;
use assert_json_diff::assert_json_eq;
use maplit::btreemap;
use serde_json::json;

use diagd::routines::{
    Command, GetRoutineUpdateRequest, RoutineKind, RoutineService, RoutineStatus,
    RunRoutineRequest, NO_COMMAND_SPECIFIED_MESSAGE,
};

use super::fixture::*;

#[tokio::test]
async fn test_available_routines() -> Result<()> {
    let factory = FakeFactory::default();
    let service = RoutineService::new(fake_registry(&factory));

    let response = service.get_available_routines().await;
    assert_json_eq!(
        serde_json::to_value(&response)?,
        json!({"routines": ["BATTERY_CAPACITY", "AC_POWER"]})
    );
    assert_eq!(
        response.routines,
        vec![RoutineKind::BatteryCapacity, RoutineKind::AcPower]
    );
    Ok(())
}

#[tokio::test]
async fn test_run_without_parameters_fails_to_start() -> Result<()> {
    let factory = FakeFactory::default();
    let service = RoutineService::new(fake_registry(&factory));

    let response = service.run_routine(RunRoutineRequest { routine: None }).await;
    assert_json_eq!(
        serde_json::to_value(&response)?,
        json!({"id": 0, "status": "FAILED_TO_START"})
    );
    assert!(factory.journal().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_update_without_command_is_error() -> Result<()> {
    let factory = FakeFactory::default();
    let service = RoutineService::new(fake_registry(&factory));

    let request: GetRoutineUpdateRequest = serde_json::from_value(json!({"id": 5}))?;
    let update = service.get_routine_update(request).await;
    assert_json_eq!(
        serde_json::to_value(&update)?,
        json!({
            "id": 5,
            "status": "ERROR",
            "statusMessage": NO_COMMAND_SPECIFIED_MESSAGE,
            "progressPercent": 0,
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_routine_wire_shape() -> Result<()> {
    let factory = FakeFactory::default();
    let service = RoutineService::new(fake_registry(&factory));

    let update = service
        .get_routine_update(GetRoutineUpdateRequest {
            id: 9,
            command: Some(Command::GetStatus),
            include_output: true,
        })
        .await;
    assert_json_eq!(
        serde_json::to_value(&update)?,
        json!({
            "id": 9,
            "status": "ERROR",
            "statusMessage": "Specified routine does not exist.",
            "progressPercent": 0,
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_ac_power_round_trip_over_json() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! {}, &[("AC", "1", "Mains")])?;
    let service = RoutineService::new(sysfs_registry(&root, &ScriptedProcessAdapter::default()));

    let request: RunRoutineRequest = serde_json::from_value(json!({
        "routine": {"acPower": {"expectedConnected": true, "expectedPowerType": "Mains"}}
    }))?;
    let response = service.run_routine(request).await;
    assert_eq!(response.id, 1);
    assert_eq!(response.status, RoutineStatus::Waiting);

    let update = service
        .get_routine_update(GetRoutineUpdateRequest {
            id: response.id,
            command: Some(Command::GetStatus),
            include_output: false,
        })
        .await;
    assert_eq!(
        serde_json::to_value(&update)?["userMessage"],
        json!("PLUG_IN_AC_POWER")
    );

    let update = service
        .get_routine_update(GetRoutineUpdateRequest {
            id: response.id,
            command: Some(Command::Resume),
            include_output: false,
        })
        .await;
    assert_eq!(update.status, RoutineStatus::Passed);

    let update = service
        .get_routine_update(GetRoutineUpdateRequest {
            id: response.id,
            command: Some(Command::Remove),
            include_output: false,
        })
        .await;
    assert_eq!(update.status, RoutineStatus::Removed);
    Ok(())
}

#[tokio::test]
async fn test_service_handles_are_shared() -> Result<()> {
    let factory = FakeFactory::default();
    let service = RoutineService::new(fake_registry(&factory));
    let other = service.clone();

    let handle = tokio::spawn(async move {
        other
            .run_routine(RunRoutineRequest {
                routine: Some(diagd::routines::RoutineParameters::StorageSelfTest(
                    Default::default(),
                )),
            })
            .await
    });
    let id = handle.await?.id;

    let update = service
        .get_routine_update(GetRoutineUpdateRequest {
            id,
            command: Some(Command::GetStatus),
            include_output: true,
        })
        .await;
    assert_eq!(update.status, RoutineStatus::Running);
    assert_eq!(update.output.as_deref(), Some(&b"fake output"[..]));
    Ok(())
}
