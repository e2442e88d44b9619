//! Redis Streams-backed `StreamBroker` (XADD/XGROUP/XREADGROUP/XACK/XRANGE/
//! XTRIM), adapted from the synchronous draft the corpus carries for this
//! purpose into the Tokio multiplexed connection this workspace's
//! controllers and scheduler actually run on.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::instrument;

use crate::error::BrokerError;
use crate::stream::{GroupStart, ReadFrom, StreamBroker, StreamEntry, StreamId, TrimSpec};

#[derive(Clone)]
pub struct RedisStreamBroker {
    conn: redis::aio::ConnectionManager,
}

impl RedisStreamBroker {
    pub fn new(conn: redis::aio::ConnectionManager) -> Self {
        Self { conn }
    }
}

/// Parses one `XREAD`/`XREADGROUP` reply entry: `[id, [field, value, ...]]`.
fn parse_entry(id: String, field_values: Vec<(String, String)>) -> StreamEntry {
    StreamEntry {
        id,
        fields: field_values.into_iter().collect(),
    }
}

#[async_trait]
impl StreamBroker for RedisStreamBroker {
    #[instrument(skip(self, fields), fields(stream = %stream))]
    async fn publish(
        &self,
        stream: &str,
        fields: HashMap<String, String>,
    ) -> Result<StreamId, BrokerError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("XADD");
        cmd.arg(stream).arg("*");
        for (k, v) in &fields {
            cmd.arg(k).arg(v);
        }
        let id: String = cmd.query_async(&mut conn).await?;
        Ok(id)
    }

    #[instrument(skip(self), fields(stream = %stream, group = %group))]
    async fn create_group(
        &self,
        stream: &str,
        group: &str,
        start: GroupStart,
    ) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<String> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream)
            .arg(group)
            .arg(start.as_arg())
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;
        match result {
            Ok(_) => Ok(()),
            // BUSYGROUP: the group already exists — treated as success.
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(stream = %stream, group = %group, consumer = %consumer))]
    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: u64,
        from: ReadFrom,
    ) -> Result<Vec<StreamEntry>, BrokerError> {
        let mut conn = self.conn.clone();
        let id_arg = match &from {
            ReadFrom::Undelivered => ">".to_string(),
            ReadFrom::Pending(id) => id.clone(),
        };

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP").arg(group).arg(consumer).arg("COUNT").arg(count);
        // Replaying a consumer's own pending backlog must not block: those
        // entries already exist, so BLOCK only makes sense for ">" reads.
        if matches!(from, ReadFrom::Undelivered) {
            cmd.arg("BLOCK").arg(block_ms);
        }
        cmd.arg("STREAMS").arg(stream).arg(id_arg);

        let reply: Option<HashMap<String, Vec<(String, Vec<(String, String)>)>>> =
            cmd.query_async(&mut conn).await?;

        let Some(reply) = reply else {
            return Ok(vec![]);
        };
        let Some(entries) = reply.get(stream) else {
            return Ok(vec![]);
        };

        Ok(entries
            .iter()
            .cloned()
            .map(|(id, fv)| parse_entry(id, fv))
            .collect())
    }

    #[instrument(skip(self, ids), fields(stream = %stream, group = %group))]
    async fn ack(&self, stream: &str, group: &str, ids: &[StreamId]) -> Result<u64, BrokerError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let acked: u64 = conn.xack(stream, group, ids).await?;
        Ok(acked)
    }

    #[instrument(skip(self), fields(stream = %stream))]
    async fn range(
        &self,
        stream: &str,
        lo: &str,
        hi: &str,
    ) -> Result<Vec<StreamEntry>, BrokerError> {
        let mut conn = self.conn.clone();
        let entries: Vec<(String, Vec<(String, String)>)> =
            conn.xrange(stream, lo, hi).await?;
        Ok(entries
            .into_iter()
            .map(|(id, fv)| parse_entry(id, fv))
            .collect())
    }

    #[instrument(skip(self), fields(stream = %stream))]
    async fn trim(
        &self,
        stream: &str,
        spec: TrimSpec,
        approximate: bool,
    ) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        match spec {
            TrimSpec::MinId(min_id) => {
                let mut cmd = redis::cmd("XTRIM");
                cmd.arg(stream).arg("MINID");
                if approximate {
                    cmd.arg("~");
                }
                cmd.arg(min_id);
                let _: i64 = cmd.query_async(&mut conn).await?;
            }
            TrimSpec::MaxLen(max_len) => {
                let mut cmd = redis::cmd("XTRIM");
                cmd.arg(stream).arg("MAXLEN");
                if approximate {
                    cmd.arg("~");
                }
                cmd.arg(max_len);
                let _: i64 = cmd.query_async(&mut conn).await?;
            }
        }
        Ok(())
    }
}
