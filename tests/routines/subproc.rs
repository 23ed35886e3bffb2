// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};

use diagd::routines::{
    Command, Config, ProcessStatus, RandomnessSoakParameters, Registry, Routine, RoutineId,
    RoutineParameters, RoutineStatus, RoutineUpdate, StorageSelfTestParameters, SubprocRoutine,
    PROGRESS_PERCENT_UNKNOWN, SUBPROC_FAILED_TO_LAUNCH_MESSAGE, SUBPROC_SUCCEEDED_MESSAGE,
};

use super::fixture::*;

fn storage_self_test() -> RoutineParameters {
    RoutineParameters::StorageSelfTest(StorageSelfTestParameters {})
}

fn storage_registry(program: &str) -> Registry {
    Registry::new(
        Config::builder()
            .sysfs_root("/nonexistent")
            .smartctl_check_path(program)
            .with_timestamp_provider(Arc::new(FixedTsProvider {}))
            .build(),
    )
}

async fn poll_until_settled(registry: &mut Registry, id: RoutineId) -> Result<RoutineUpdate> {
    for _ in 0..200 {
        let update = registry.update(id, Command::GetStatus, true);
        if !matches!(
            update.status,
            RoutineStatus::Running | RoutineStatus::Cancelling
        ) {
            return Ok(update);
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    Err(anyhow!("routine {} did not settle", id))
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_successful_program_passes() -> Result<()> {
    let mut registry = storage_registry("true");

    let response = registry.run(&storage_self_test());
    let update = poll_until_settled(&mut registry, response.id).await?;

    assert_eq!(update.status, RoutineStatus::Passed);
    assert_eq!(update.status_message, SUBPROC_SUCCEEDED_MESSAGE);
    assert_eq!(update.progress_percent, 100);
    assert_eq!(update.output, None);
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_failing_program_fails() -> Result<()> {
    let mut registry = storage_registry("false");

    let response = registry.run(&storage_self_test());
    let update = poll_until_settled(&mut registry, response.id).await?;

    assert_eq!(update.status, RoutineStatus::Failed);
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_missing_program_fails_to_start() -> Result<()> {
    let mut registry = storage_registry("/nonexistent/smartctl-check");

    let response = registry.run(&storage_self_test());
    assert_eq!(response.status, RoutineStatus::FailedToStart);

    let update = registry.update(response.id, Command::GetStatus, false);
    assert_eq!(update.status, RoutineStatus::FailedToStart);
    assert_eq!(update.status_message, SUBPROC_FAILED_TO_LAUNCH_MESSAGE);
    assert_eq!(update.progress_percent, PROGRESS_PERCENT_UNKNOWN);
    Ok(())
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_cancelling_real_process() -> Result<()> {
    let config = Config::builder().build();
    let mut routine =
        SubprocRoutine::new(&config, vec!["sleep".to_owned(), "30".to_owned()], None);

    routine.start();
    assert_eq!(routine.status(), RoutineStatus::Running);

    routine.cancel();
    for _ in 0..200 {
        if routine.status() != RoutineStatus::Cancelling {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert_eq!(routine.status(), RoutineStatus::Cancelled);
    Ok(())
}

#[test]
fn test_randomness_soak_command_line_and_cancel() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    let adapter = ScriptedProcessAdapter::default();
    let mut registry = sysfs_registry(&root, &adapter);

    let response = registry.run(&RoutineParameters::RandomnessSoak(
        RandomnessSoakParameters { length_seconds: 3 },
    ));
    assert_eq!(response.status, RoutineStatus::Running);
    assert_eq!(
        adapter.launched(),
        vec![vec!["/usr/bin/urandom", "--time_delta_ms=3000"]]
    );

    // the fixed clock never advances
    let update = registry.update(response.id, Command::GetStatus, false);
    assert_eq!(update.progress_percent, 0);

    let update = registry.update(response.id, Command::Cancel, false);
    assert_eq!(update.status, RoutineStatus::Cancelling);
    assert_eq!(adapter.kills(0), 1);

    adapter.set_status(0, ProcessStatus::ExitedError);
    let update = registry.update(response.id, Command::GetStatus, false);
    assert_eq!(update.status, RoutineStatus::Cancelled);
    Ok(())
}

#[test]
fn test_launch_failure_through_registry() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    let adapter = ScriptedProcessAdapter {
        fail_launch: true,
        ..Default::default()
    };
    let mut registry = sysfs_registry(&root, &adapter);

    let response = registry.run(&storage_self_test());
    assert_eq!(response.status, RoutineStatus::FailedToStart);
    assert_ne!(response.id, 0);

    let response = registry.run(&RoutineParameters::RandomnessSoak(
        RandomnessSoakParameters { length_seconds: 10 },
    ));
    let update = registry.update(response.id, Command::GetStatus, false);
    assert_eq!(update.status, RoutineStatus::FailedToStart);
    assert_eq!(update.progress_percent, PROGRESS_PERCENT_UNKNOWN);
    Ok(())
}

#[test]
fn test_program_outside_runtime_fails_to_start() {
    let mut registry = storage_registry("true");

    let response = registry.run(&storage_self_test());
    assert_eq!(response.status, RoutineStatus::FailedToStart);

    let update = registry.update(response.id, Command::GetStatus, false);
    assert_eq!(update.status_message, SUBPROC_FAILED_TO_LAUNCH_MESSAGE);
}
