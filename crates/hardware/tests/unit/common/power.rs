//! # Power Lifecycle Tests

use microsim_core::common::power::{PowerStatus, StatusCell, agreed_status};

/// Verifies that a new cell is OFF and that clones observe the same value.
#[test]
fn test_status_cell_is_shared() {
    let cell = StatusCell::new();
    let worker_view = cell.clone();
    assert_eq!(cell.get(), PowerStatus::Off);

    worker_view.set(PowerStatus::On);
    assert_eq!(cell.get(), PowerStatus::On);
}

/// Verifies the compare-and-swap transition and the status reported on failure.
#[test]
fn test_transition_reports_observed_status() {
    let cell = StatusCell::new();
    assert_eq!(cell.transition(PowerStatus::Off, PowerStatus::Starting), Ok(()));
    assert_eq!(
        cell.transition(PowerStatus::Off, PowerStatus::Starting),
        Err(PowerStatus::Starting)
    );
    assert_eq!(cell.get(), PowerStatus::Starting);
}

/// Verifies the full OFF -> STARTING -> ON -> STOPPING -> OFF cycle.
#[test]
fn test_full_cycle() {
    let cell = StatusCell::new();
    let cycle = [
        (PowerStatus::Off, PowerStatus::Starting),
        (PowerStatus::Starting, PowerStatus::On),
        (PowerStatus::On, PowerStatus::Stopping),
        (PowerStatus::Stopping, PowerStatus::Off),
    ];
    for (from, to) in cycle {
        cell.transition(from, to).unwrap();
    }
    assert_eq!(cell.get(), PowerStatus::Off);
}

/// Verifies the upper-case display names.
#[test]
fn test_status_display() {
    assert_eq!(PowerStatus::Off.to_string(), "OFF");
    assert_eq!(PowerStatus::Starting.to_string(), "STARTING");
    assert_eq!(PowerStatus::On.to_string(), "ON");
    assert_eq!(PowerStatus::Stopping.to_string(), "STOPPING");
}

/// Verifies that a composite reports the status its children share.
#[test]
fn test_agreed_status() {
    let status = agreed_status("test", [PowerStatus::On, PowerStatus::On, PowerStatus::On]);
    assert_eq!(status, PowerStatus::On);
}

/// Verifies that divergent children are treated as a wiring bug.
#[test]
#[should_panic(expected = "children disagree")]
fn test_agreed_status_panics_on_divergence() {
    let _ = agreed_status("test", [PowerStatus::On, PowerStatus::Off]);
}
