/// 이벤트 저장소와 아웃박스 릴레이
/// 경매 이벤트와 알림은 상태 변경과 같은 트랜잭션에서 기록되고(아웃박스),
/// 릴레이가 주기적으로 브로커에 발행한 뒤 발행 완료로 표시한다.
/// 메시지 키는 레코드 id 이므로 재발행되더라도 소비자가 중복을 걸러낼 수 있다.
// region:    --- Imports
use crate::clock::Clock;
use crate::database::Store;
use crate::error::MarketResult;
use crate::message_broker::EventPublisher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Event Model
pub const EVENTS_TOPIC: &str = "events";
pub const NOTIFICATIONS_TOPIC: &str = "notifications";

/// 이벤트 저장소에 저장되는 이벤트 모델
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub aggregate_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// 경매 version 과 같은 값 (경매별 일련번호)
    pub version: i64,
    pub published_at: Option<DateTime<Utc>>,
}
// endregion: --- Event Model

// region:    --- Outbox Relay
/// 아웃박스 릴레이
pub struct OutboxRelay {
    store: Arc<dyn Store>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    batch_size: i64,
}

impl OutboxRelay {
    pub fn new(
        store: Arc<dyn Store>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            publisher,
            clock,
            batch_size,
        }
    }

    /// 미발행 이벤트와 알림을 한 배치씩 발행
    /// 발행 실패 시 남은 레코드는 다음 주기에 다시 시도된다.
    pub async fn relay_once(&self) -> MarketResult<usize> {
        let mut published = 0;

        for event in self.store.unpublished_events(self.batch_size).await? {
            let payload = serde_json::to_string(&event)?;
            self.publisher
                .publish(EVENTS_TOPIC, &event.id.to_string(), &payload)
                .await?;
            self.store
                .mark_event_published(event.id, self.clock.now())
                .await?;
            debug!(
                "{:<12} --> 이벤트 발행: id={}, type={}",
                "Outbox", event.id, event.event_type
            );
            published += 1;
        }

        for notification in self.store.unpublished_notifications(self.batch_size).await? {
            let payload = serde_json::to_string(&notification)?;
            self.publisher
                .publish(NOTIFICATIONS_TOPIC, &notification.id.to_string(), &payload)
                .await?;
            self.store
                .mark_notification_published(notification.id, self.clock.now())
                .await?;
            published += 1;
        }

        if published > 0 {
            info!("{:<12} --> 아웃박스 발행 완료: {}건", "Outbox", published);
        }
        Ok(published)
    }
}
// endregion: --- Outbox Relay
