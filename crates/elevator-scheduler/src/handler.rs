//! Per-message handling: parse, route (internal bypass / external scoring),
//! dispatch a command. Never panics and never fails the
//! caller — every outcome, including "no suitable elevator", is logged and
//! considered handled so the caller can ack unconditionally afterward.

use std::collections::HashMap;

use elevator_broker::{Broker, PubSubBroker};
use elevator_core::{Command, Request};
use tracing::{info, warn};

use crate::cache::SnapshotCache;
use crate::keys::commands_topic;
use crate::scoring::select_best_elevator;

pub async fn handle_entry(fields: &HashMap<String, String>, cache: &SnapshotCache, broker: &dyn Broker) {
    let request = match Request::from_dict(fields) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, ?fields, "failed to parse request entry, dropping");
            return;
        }
    };

    match request {
        Request::Internal {
            id,
            elevator_id,
            destination_floor,
            ..
        } => {
            let topic = commands_topic(elevator_id);
            let command = Command::add_destination(destination_floor, id).with_correlation_id(id.to_string());
            if let Err(err) = publish_command(broker, &topic, &command).await {
                warn!(request_id = %id, error = %err, "failed to publish add_destination command");
            }
        }
        Request::External {
            id, floor, direction, ..
        } => {
            let snapshots = cache.snapshot();
            match select_best_elevator(&snapshots, floor, direction) {
                Some(elevator_id) => {
                    let topic = commands_topic(elevator_id);
                    let command = Command::go_to_floor(floor, id).with_correlation_id(id.to_string());
                    if let Err(err) = publish_command(broker, &topic, &command).await {
                        warn!(request_id = %id, error = %err, "failed to publish go_to_floor command");
                    }
                }
                None => {
                    info!(request_id = %id, floor = floor.get(), "no_suitable_elevator");
                }
            }
        }
    }
}

async fn publish_command(
    broker: &dyn Broker,
    topic: &str,
    command: &Command,
) -> Result<(), elevator_broker::BrokerError> {
    let payload = serde_json::to_string(command).expect("command is always serializable");
    PubSubBroker::publish(broker, topic, payload).await
}
