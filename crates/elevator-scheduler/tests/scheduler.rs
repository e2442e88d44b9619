use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use elevator_broker::{
    Broker, GroupStart, InMemoryBroker, PubSubBroker, PubSubMessage, ReadFrom, StreamBroker,
};
use elevator_core::{Command, Direction, Request};
use elevator_scheduler::{Scheduler, SchedulerConfig};
use elevator_store::{InMemoryStateStore, StateStore};

const REQUESTS_STREAM: &str = "elevator:requests:stream";
const SCHEDULER_GROUP: &str = "scheduler-group";

async fn recv_command(sub: &mut elevator_broker::PubSubSubscription) -> Command {
    loop {
        match tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .expect("timed out waiting for command")
        {
            Some(PubSubMessage::Subscribed { .. }) => continue,
            Some(PubSubMessage::Message { data, .. }) => {
                return serde_json::from_str(&data).unwrap();
            }
            None => panic!("subscription closed unexpectedly"),
        }
    }
}

#[tokio::test]
async fn idle_nearest_elevator_is_dispatched() {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let store_dyn: Arc<dyn StateStore> = store.clone();
    let broker_dyn: Arc<dyn Broker> = broker.clone();

    let mut sub = PubSubBroker::subscribe(broker.as_ref(), "elevator:commands:1")
        .await
        .unwrap();

    let scheduler = Scheduler::new(
        SchedulerConfig {
            scheduler_id: "1".to_string(),
            num_elevators: 3,
        },
        store_dyn,
        broker_dyn,
    );
    let handle = scheduler.spawn().await.unwrap();

    let request = Request::new_external(3, Direction::Up, 10).unwrap();
    StreamBroker::publish(broker.as_ref(), REQUESTS_STREAM, request.to_dict())
        .await
        .unwrap();

    let command = recv_command(&mut sub).await;
    assert_eq!(command.floor.get(), 3);

    handle.stop().await;
}

#[tokio::test]
async fn internal_request_bypasses_scoring() {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let store_dyn: Arc<dyn StateStore> = store.clone();
    let broker_dyn: Arc<dyn Broker> = broker.clone();

    let mut sub = PubSubBroker::subscribe(broker.as_ref(), "elevator:commands:2")
        .await
        .unwrap();

    let scheduler = Scheduler::new(
        SchedulerConfig {
            scheduler_id: "1".to_string(),
            num_elevators: 3,
        },
        store_dyn,
        broker_dyn,
    );
    let handle = scheduler.spawn().await.unwrap();

    let request = Request::new_internal(2, 7, 3, 10).unwrap();
    StreamBroker::publish(broker.as_ref(), REQUESTS_STREAM, request.to_dict())
        .await
        .unwrap();

    let command = recv_command(&mut sub).await;
    assert_eq!(command.floor.get(), 7);

    handle.stop().await;
}

#[tokio::test]
async fn malformed_entry_does_not_block_subsequent_processing() {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());
    let store_dyn: Arc<dyn StateStore> = store.clone();
    let broker_dyn: Arc<dyn Broker> = broker.clone();

    let mut sub = PubSubBroker::subscribe(broker.as_ref(), "elevator:commands:2")
        .await
        .unwrap();

    let scheduler = Scheduler::new(
        SchedulerConfig {
            scheduler_id: "1".to_string(),
            num_elevators: 3,
        },
        store_dyn,
        broker_dyn,
    );
    let handle = scheduler.spawn().await.unwrap();

    let mut garbage = HashMap::new();
    garbage.insert("request_type".to_string(), "not_a_real_type".to_string());
    StreamBroker::publish(broker.as_ref(), REQUESTS_STREAM, garbage)
        .await
        .unwrap();

    let valid = Request::new_internal(2, 6, 3, 10).unwrap();
    StreamBroker::publish(broker.as_ref(), REQUESTS_STREAM, valid.to_dict())
        .await
        .unwrap();

    let command = recv_command(&mut sub).await;
    assert_eq!(command.floor.get(), 6);

    handle.stop().await;
}

#[tokio::test]
async fn restart_recovery_drains_pending_backlog_before_new_entries() {
    let store = Arc::new(InMemoryStateStore::new());
    let broker = Arc::new(InMemoryBroker::new());

    // Simulate a previous scheduler incarnation: group already exists, two
    // entries were delivered to consumer "1" but never acked (it "crashed").
    broker
        .create_group(REQUESTS_STREAM, SCHEDULER_GROUP, GroupStart::Beginning)
        .await
        .unwrap();
    let stranded_a = Request::new_internal(1, 2, 3, 10).unwrap();
    let stranded_b = Request::new_internal(1, 3, 3, 10).unwrap();
    StreamBroker::publish(broker.as_ref(), REQUESTS_STREAM, stranded_a.to_dict())
        .await
        .unwrap();
    StreamBroker::publish(broker.as_ref(), REQUESTS_STREAM, stranded_b.to_dict())
        .await
        .unwrap();
    let delivered = broker
        .read_group(REQUESTS_STREAM, SCHEDULER_GROUP, "1", 10, 10, ReadFrom::Undelivered)
        .await
        .unwrap();
    assert_eq!(delivered.len(), 2);

    let mut sub = PubSubBroker::subscribe(broker.as_ref(), "elevator:commands:1")
        .await
        .unwrap();

    let store_dyn: Arc<dyn StateStore> = store.clone();
    let broker_dyn: Arc<dyn Broker> = broker.clone();
    let scheduler = Scheduler::new(
        SchedulerConfig {
            scheduler_id: "1".to_string(),
            num_elevators: 3,
        },
        store_dyn,
        broker_dyn,
    );
    let handle = scheduler.spawn().await.unwrap();

    // Both stranded entries must surface as commands before the new one.
    let first = recv_command(&mut sub).await;
    let second = recv_command(&mut sub).await;
    assert_eq!(
        vec![first.floor.get(), second.floor.get()]
            .into_iter()
            .collect::<std::collections::HashSet<_>>(),
        std::collections::HashSet::from([2, 3])
    );

    let fresh = Request::new_internal(1, 9, 3, 10).unwrap();
    StreamBroker::publish(broker.as_ref(), REQUESTS_STREAM, fresh.to_dict())
        .await
        .unwrap();
    let third = recv_command(&mut sub).await;
    assert_eq!(third.floor.get(), 9);

    handle.stop().await;
}
