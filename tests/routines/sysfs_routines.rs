// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use anyhow::Result;
use maplit::btreemap;
use predicates::prelude::*;

use diagd::routines::{
    AcPowerParameters, BatteryCapacityParameters, BatteryHealthParameters, Command,
    RoutineParameters, RoutineStatus, UserMessage, AC_POWER_CANCELLED_MESSAGE,
    AC_POWER_NOT_ONLINE_MESSAGE, AC_POWER_NO_VALID_POWER_SUPPLY_MESSAGE,
    BATTERY_HEALTH_PASSED_MESSAGE,
};

use super::fixture::*;

fn capacity(low: u32, high: u32) -> RoutineParameters {
    RoutineParameters::BatteryCapacity(BatteryCapacityParameters {
        low_mah: Some(low),
        high_mah: Some(high),
    })
}

fn ac_power(connected: bool, kind: Option<&str>) -> RoutineParameters {
    RoutineParameters::AcPower(AcPowerParameters {
        expected_connected: connected,
        expected_power_type: kind.map(str::to_owned),
    })
}

#[test]
fn test_battery_capacity_verdicts() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! { "charge_full_design" => "6000000" }, &[])?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let passed = registry.run(&capacity(1000, 10000));
    assert_eq!(passed.status, RoutineStatus::Passed);

    let failed = registry.run(&capacity(7000, 10000));
    assert_eq!(failed.status, RoutineStatus::Failed);

    let update = registry.update(failed.id, Command::GetStatus, true);
    assert_eq!(update.progress_percent, 100);
    Ok(())
}

#[test]
fn test_battery_capacity_unreadable_is_error() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! {}, &[])?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let response = registry.run(&capacity(1000, 10000));
    assert_eq!(response.status, RoutineStatus::Error);
    Ok(())
}

#[test]
fn test_sysfs_routines_ignore_resume_and_cancel() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! { "charge_full_design" => "6000000" }, &[])?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let id = registry.run(&capacity(1000, 10000)).id;
    assert_eq!(
        registry.update(id, Command::Resume, false).status,
        RoutineStatus::Passed
    );
    assert_eq!(
        registry.update(id, Command::Cancel, false).status,
        RoutineStatus::Passed
    );
    Ok(())
}

#[test]
fn test_battery_health_output_only_when_requested() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(
        &root,
        btreemap! {
            "charge_full" => "5900000",
            "charge_full_design" => "6000000",
            "cycle_count" => "12",
            "model_name" => "PA-42",
        },
        &[],
    )?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let response = registry.run(&RoutineParameters::BatteryHealth(BatteryHealthParameters {
        maximum_cycle_count: 100,
        percent_battery_wear_allowed: 5,
    }));
    assert_eq!(response.status, RoutineStatus::Passed);

    let update = registry.update(response.id, Command::GetStatus, false);
    assert_eq!(update.status_message, BATTERY_HEALTH_PASSED_MESSAGE);
    assert_eq!(update.output, None);

    let update = registry.update(response.id, Command::GetStatus, true);
    let output = String::from_utf8(update.output.unwrap_or_default())?;
    assert!(predicate::str::contains("model_name: PA-42").eval(&output));
    assert!(predicate::str::contains("cycle_count: 12").eval(&output));
    Ok(())
}

#[test]
fn test_ac_power_waits_then_passes() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! {}, &[("AC", "1", "Mains")])?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let response = registry.run(&ac_power(true, Some("Mains")));
    assert_eq!(response.status, RoutineStatus::Waiting);

    let update = registry.update(response.id, Command::GetStatus, false);
    assert_eq!(update.progress_percent, 33);
    assert_eq!(update.user_message, Some(UserMessage::PlugInAcPower));

    let update = registry.update(response.id, Command::Resume, false);
    assert_eq!(update.status, RoutineStatus::Passed);
    assert_eq!(update.progress_percent, 100);
    assert_eq!(update.user_message, None);
    Ok(())
}

#[test]
fn test_ac_power_offline_fails() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! {}, &[("AC", "0", "Mains")])?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let id = registry.run(&ac_power(true, None)).id;
    let update = registry.update(id, Command::Resume, false);
    assert_eq!(update.status, RoutineStatus::Failed);
    assert_eq!(update.status_message, AC_POWER_NOT_ONLINE_MESSAGE);
    Ok(())
}

#[test]
fn test_ac_power_without_supply_is_error() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! {}, &[])?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let id = registry.run(&ac_power(false, None)).id;
    assert_eq!(
        registry.update(id, Command::GetStatus, false).user_message,
        Some(UserMessage::UnplugAcPower)
    );

    let update = registry.update(id, Command::Resume, false);
    assert_eq!(update.status, RoutineStatus::Error);
    assert_eq!(update.status_message, AC_POWER_NO_VALID_POWER_SUPPLY_MESSAGE);
    assert_eq!(update.progress_percent, 33);
    Ok(())
}

#[test]
fn test_ac_power_cancel_while_waiting() -> Result<()> {
    let root = assert_fs::TempDir::new()?;
    write_sysfs(&root, btreemap! {}, &[("AC", "1", "Mains")])?;
    let mut registry = sysfs_registry(&root, &ScriptedProcessAdapter::default());

    let id = registry.run(&ac_power(true, None)).id;
    let update = registry.update(id, Command::Cancel, false);
    assert_eq!(update.status, RoutineStatus::Cancelled);
    assert_eq!(update.status_message, AC_POWER_CANCELLED_MESSAGE);
    assert_eq!(update.progress_percent, 33);

    let update = registry.update(id, Command::Resume, false);
    assert_eq!(update.status, RoutineStatus::Cancelled);
    Ok(())
}
