/// 알림
/// 알림은 상태 변경과 같은 트랜잭션에서 아웃박스(notifications 테이블)에 기록되고,
/// 이후 아웃박스 릴레이가 메시지 브로커로 발행한다.
// region:    --- Imports
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Model
text_enum! {
    pub enum NotificationKind {
        Outbid => "OUTBID",
        AuctionWon => "AUCTION_WON",
        AuctionEnded => "AUCTION_ENDED",
        AuctionApproved => "AUCTION_APPROVED",
        ProductApproved => "PRODUCT_APPROVED",
        ProductRejected => "PRODUCT_REJECTED",
        ProductDeleted => "PRODUCT_DELETED",
        ViolationWarning => "VIOLATION_WARNING",
        AccountSuspended => "ACCOUNT_SUSPENDED",
        SuspensionLifted => "SUSPENSION_LIFTED",
        ReportResolved => "REPORT_RESOLVED",
        ReportRejected => "REPORT_REJECTED",
        TrustRecovered => "TRUST_RECOVERED",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub reference_id: Option<i64>,
    pub read: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 저장 전 알림
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub reference_id: Option<i64>,
}

impl NewNotification {
    pub fn new(
        user_id: i64,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            body: body.into(),
            reference_id: None,
        }
    }

    pub fn about(mut self, reference_id: i64) -> Self {
        self.reference_id = Some(reference_id);
        self
    }
}
// endregion: --- Model

// region:    --- Queries
/// 사용자 알림 조회 (최신순)
pub async fn list_notifications(store: &dyn Store, user_id: i64) -> MarketResult<Vec<Notification>> {
    info!("{:<12} --> 알림 조회 user: {}", "Notify", user_id);
    store
        .user(user_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("사용자 {user_id}")))?;
    store.notifications(user_id).await
}

/// 알림 읽음 처리
pub async fn mark_notification_read(
    store: &dyn Store,
    notification_id: i64,
    user_id: i64,
) -> MarketResult<Notification> {
    info!(
        "{:<12} --> 알림 읽음 처리 id: {}, user: {}",
        "Notify", notification_id, user_id
    );
    store
        .mark_notification_read(notification_id, user_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("알림 {notification_id}")))
}
// endregion: --- Queries

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::users::{NewUser, Role, UserUpdate};
    use chrono::Utc;

    #[tokio::test]
    async fn notifications_are_private_to_their_owner() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let alice = store
            .insert_user(NewUser::new("alice", "alice@example.com", Role::User), now)
            .await
            .unwrap();
        let bob = store
            .insert_user(NewUser::new("bob", "bob@example.com", Role::User), now)
            .await
            .unwrap();
        let update = UserUpdate::from_user(&alice).notify(NewNotification::new(
            alice.id,
            NotificationKind::TrustRecovered,
            "신뢰도 회복",
            "신뢰도가 회복되었습니다.",
        ));
        store.update_user(update, now).await.unwrap();

        let listed = list_notifications(&store, alice.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].read);

        let err = mark_notification_read(&store, listed[0].id, bob.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let read = mark_notification_read(&store, listed[0].id, alice.id)
            .await
            .unwrap();
        assert!(read.read);
    }
}
