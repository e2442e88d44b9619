use std::sync::Arc;
use std::time::Duration;

use elevator_broker::{Broker, InMemoryBroker, PubSubBroker};
use elevator_controller::{Controller, ControllerConfig};
use elevator_core::{Command, DoorStatus, ElevatorId, MotionStatus, MotionTiming, RequestId, StatusSnapshot};
use elevator_store::{InMemoryStateStore, StateStore};

fn fast_timing() -> MotionTiming {
    MotionTiming {
        floor_travel_time_secs: 0.01,
        door_operation_time_secs: 0.01,
    }
}

async fn wait_for<F: Fn(&StatusSnapshot) -> bool>(
    store: &InMemoryStateStore,
    key: &str,
    predicate: F,
) -> StatusSnapshot {
    for _ in 0..500 {
        if let Some(json) = store.get(key).await.unwrap() {
            let snapshot: StatusSnapshot = serde_json::from_str(&json).unwrap();
            if predicate(&snapshot) {
                return snapshot;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition on {key} was never observed");
}

async fn publish_command(broker: &InMemoryBroker, topic: &str, command: &Command) {
    PubSubBroker::publish(broker, topic, serde_json::to_string(command).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn door_only_at_current_floor_does_not_move() {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let store_dyn: Arc<dyn StateStore> = store.clone();
    let broker_dyn: Arc<dyn Broker> = broker.clone();
    let id = ElevatorId::new(1);

    let controller = Controller::new(
        id,
        store_dyn,
        broker_dyn,
        ControllerConfig {
            num_floors: 10,
            timing: fast_timing(),
        },
    );
    let handle = controller.spawn().await.unwrap();

    publish_command(
        &broker,
        "elevator:commands:1",
        &Command::go_to_floor(1.into(), RequestId::new()),
    )
    .await;

    let opened = wait_for(&store, "elevator:status:1", |s| {
        s.elevator.door_status == DoorStatus::Open
    })
    .await;
    assert_eq!(opened.elevator.current_floor.get(), 1);
    assert!(opened.elevator.destinations.is_empty());

    let closed = wait_for(&store, "elevator:status:1", |s| {
        s.elevator.door_status == DoorStatus::Closed && s.timestamp > opened.timestamp
    })
    .await;
    assert_eq!(closed.elevator.current_floor.get(), 1);

    handle.stop().await;
}

#[tokio::test]
async fn travel_then_arrival_publishes_expected_sequence() {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let store_dyn: Arc<dyn StateStore> = store.clone();
    let broker_dyn: Arc<dyn Broker> = broker.clone();
    let id = ElevatorId::new(1);

    let controller = Controller::new(
        id,
        store_dyn,
        broker_dyn,
        ControllerConfig {
            num_floors: 10,
            timing: fast_timing(),
        },
    );
    let handle = controller.spawn().await.unwrap();

    publish_command(
        &broker,
        "elevator:commands:1",
        &Command::go_to_floor(3.into(), RequestId::new()),
    )
    .await;

    let moving = wait_for(&store, "elevator:status:1", |s| {
        s.elevator.status == MotionStatus::MovingUp
    })
    .await;
    assert_eq!(moving.elevator.current_floor.get(), 1);

    let arrived = wait_for(&store, "elevator:status:1", |s| {
        s.elevator.status == MotionStatus::Idle && s.elevator.current_floor.get() == 3
    })
    .await;
    assert_eq!(arrived.elevator.door_status, DoorStatus::Closed);

    let opened = wait_for(&store, "elevator:status:1", |s| {
        s.elevator.door_status == DoorStatus::Open && s.timestamp > arrived.timestamp
    })
    .await;
    assert_eq!(opened.elevator.current_floor.get(), 3);

    let closed = wait_for(&store, "elevator:status:1", |s| {
        s.elevator.door_status == DoorStatus::Closed && s.timestamp > opened.timestamp
    })
    .await;
    assert!(closed.elevator.destinations.is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn add_destination_starts_movement_from_idle() {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let store_dyn: Arc<dyn StateStore> = store.clone();
    let broker_dyn: Arc<dyn Broker> = broker.clone();
    let id = ElevatorId::new(2);

    let controller = Controller::new(
        id,
        store_dyn,
        broker_dyn,
        ControllerConfig {
            num_floors: 10,
            timing: fast_timing(),
        },
    );
    let handle = controller.spawn().await.unwrap();

    publish_command(
        &broker,
        "elevator:commands:2",
        &Command::add_destination(5.into(), RequestId::new()),
    )
    .await;

    wait_for(&store, "elevator:status:2", |s| {
        s.elevator.current_floor.get() == 5 && s.elevator.status == MotionStatus::Idle
    })
    .await;

    handle.stop().await;
}
