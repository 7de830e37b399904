// region:    --- Imports
use super::{queries, Store};
use crate::auction::status::AuctionStatus;
use crate::bidding::model::{Auction, AuctionMutation, Bid, NewAuction};
use crate::error::{MarketError, MarketResult};
use crate::event_store::Event;
use crate::notifications::{NewNotification, Notification};
use crate::products::{NewProduct, Product, ProductStatus, ProductTransition};
use crate::reports::{NewReport, Report, ReportDecision, ReportStatus};
use crate::trust::INITIAL_TRUST_SCORE;
use crate::users::{NewUser, User, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Postgres Store
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    /// 데이터베이스 연결
    pub async fn connect(database_url: &str, max_connections: u32) -> MarketResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// 데이터베이스 초기화 (스키마 생성)
    pub async fn initialize_database(&self) -> MarketResult<()> {
        let create_schema_sql = include_str!("sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await?;
        info!("{:<12} --> 스키마 준비 완료", "Database");
        Ok(())
    }

    /// 여러 쿼리 실행
    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&*self.pool).await?;
            }
        }
        Ok(())
    }
}

/// 트랜잭션 안에서 알림 기록
async fn insert_notifications_tx(
    tx: &mut Transaction<'_, Postgres>,
    notifications: Vec<NewNotification>,
    at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    for notification in notifications {
        sqlx::query(queries::INSERT_NOTIFICATION)
            .bind(notification.user_id)
            .bind(notification.kind.as_str())
            .bind(&notification.title)
            .bind(&notification.body)
            .bind(notification.reference_id)
            .bind(at)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// 트랜잭션 안에서 사용자 조건부 갱신
async fn update_user_tx(
    tx: &mut Transaction<'_, Postgres>,
    update: &UserUpdate,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(queries::UPDATE_USER_IF_VERSION)
        .bind(update.user_id)
        .bind(update.expected_version)
        .bind(update.trust_score)
        .bind(update.suspended)
        .bind(&update.suspension_reason)
        .bind(update.suspended_until)
        .bind(update.last_recovery_at)
        .fetch_optional(&mut **tx)
        .await
}

fn unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, new: NewUser, at: DateTime<Utc>) -> MarketResult<User> {
        sqlx::query_as::<_, User>(queries::INSERT_USER)
            .bind(&new.display_name)
            .bind(&new.email)
            .bind(new.role.as_str())
            .bind(INITIAL_TRUST_SCORE)
            .bind(at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    MarketError::Validation(format!("이미 가입된 이메일입니다: {}", new.email))
                } else {
                    e.into()
                }
            })
    }

    async fn user(&self, id: i64) -> MarketResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(queries::GET_USER)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?)
    }

    async fn update_user(&self, update: UserUpdate, at: DateTime<Utc>) -> MarketResult<User> {
        let mut tx = self.pool.begin().await?;
        let Some(user) = update_user_tx(&mut tx, &update).await? else {
            tx.rollback().await?;
            return match self.user(update.user_id).await? {
                Some(_) => Err(MarketError::VersionConflict),
                None => Err(MarketError::not_found(format!("사용자 {}", update.user_id))),
            };
        };
        insert_notifications_tx(&mut tx, update.notifications, at).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn users_with_expired_suspension(&self, now: DateTime<Utc>) -> MarketResult<Vec<User>> {
        Ok(
            sqlx::query_as::<_, User>(queries::GET_USERS_WITH_EXPIRED_SUSPENSION)
                .bind(now)
                .fetch_all(&*self.pool)
                .await?,
        )
    }

    async fn users_due_recovery(&self, since: DateTime<Utc>) -> MarketResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(queries::GET_USERS_DUE_RECOVERY)
            .bind(since)
            .fetch_all(&*self.pool)
            .await?)
    }

    async fn insert_auction(&self, new: NewAuction, at: DateTime<Utc>) -> MarketResult<Auction> {
        Ok(sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(new.seller_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.starting_price)
            .bind(new.bid_increment)
            .bind(new.buy_now_price)
            .bind(new.start_time)
            .bind(new.end_time)
            .bind(AuctionStatus::Pending.as_str())
            .bind(at)
            .fetch_one(&*self.pool)
            .await?)
    }

    async fn auction(&self, id: i64) -> MarketResult<Option<Auction>> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?)
    }

    async fn auctions(&self) -> MarketResult<Vec<Auction>> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
            .fetch_all(&*self.pool)
            .await?)
    }

    async fn auctions_due_to_end(&self, now: DateTime<Utc>) -> MarketResult<Vec<Auction>> {
        Ok(sqlx::query_as::<_, Auction>(queries::GET_AUCTIONS_DUE_TO_END)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?)
    }

    async fn bids(&self, auction_id: i64) -> MarketResult<Vec<Bid>> {
        Ok(sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
            .bind(auction_id)
            .fetch_all(&*self.pool)
            .await?)
    }

    async fn commit_auction(&self, mutation: AuctionMutation) -> MarketResult<Auction> {
        let data = serde_json::to_value(&mutation.event)?;

        // 트랜잭션 시작
        let mut tx = self.pool.begin().await?;

        // version 이 그대로일 때만 갱신
        let updated = sqlx::query_as::<_, Auction>(queries::UPDATE_AUCTION_IF_VERSION)
            .bind(mutation.auction_id)
            .bind(mutation.expected_version)
            .bind(mutation.current_bid)
            .bind(mutation.bid_count)
            .bind(mutation.highest_bidder_id)
            .bind(mutation.status.as_str())
            .bind(mutation.at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            debug!(
                "{:<12} --> 경매 {} 버전 불일치 (기대: {})",
                "Database", mutation.auction_id, mutation.expected_version
            );
            return match self.auction(mutation.auction_id).await? {
                Some(_) => Err(MarketError::VersionConflict),
                None => Err(MarketError::not_found(format!(
                    "경매 {}",
                    mutation.auction_id
                ))),
            };
        };

        // 입찰 기록 추가
        if let Some(bid) = &mutation.bid {
            sqlx::query(queries::INSERT_BID)
                .bind(updated.id)
                .bind(bid.bidder_id)
                .bind(bid.amount)
                .bind(updated.version)
                .bind(mutation.at)
                .execute(&mut *tx)
                .await?;
        }

        // 이벤트 추가
        sqlx::query(queries::INSERT_EVENT)
            .bind(updated.id)
            .bind(mutation.event.event_type())
            .bind(&data)
            .bind(mutation.at)
            .bind(updated.version)
            .execute(&mut *tx)
            .await?;

        insert_notifications_tx(&mut tx, mutation.notifications, mutation.at).await?;

        // 트랜잭션 커밋
        tx.commit().await?;
        Ok(updated)
    }

    async fn insert_product(&self, new: NewProduct, at: DateTime<Utc>) -> MarketResult<Product> {
        Ok(sqlx::query_as::<_, Product>(queries::INSERT_PRODUCT)
            .bind(new.seller_id)
            .bind(&new.title)
            .bind(&new.description)
            .bind(new.price)
            .bind(ProductStatus::Pending.as_str())
            .bind(&new.media_urls)
            .bind(at)
            .fetch_one(&*self.pool)
            .await?)
    }

    async fn product(&self, id: i64) -> MarketResult<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>(queries::GET_PRODUCT)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?)
    }

    async fn products(&self, status: Option<ProductStatus>) -> MarketResult<Vec<Product>> {
        let products = match status {
            Some(status) => {
                sqlx::query_as::<_, Product>(queries::GET_PRODUCTS_BY_STATUS)
                    .bind(status.as_str())
                    .fetch_all(&*self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Product>(queries::GET_ALL_PRODUCTS)
                    .fetch_all(&*self.pool)
                    .await?
            }
        };
        Ok(products)
    }

    async fn transition_product(&self, transition: ProductTransition) -> MarketResult<Product> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Product>(queries::UPDATE_PRODUCT_STATUS)
            .bind(transition.product_id)
            .bind(transition.from.as_str())
            .bind(transition.to.as_str())
            .bind(&transition.rejection_reason)
            .bind(transition.at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return match self.product(transition.product_id).await? {
                Some(product) => Err(MarketError::InvalidStatus(format!(
                    "상품 {}의 상태가 {}입니다.",
                    product.id, product.status
                ))),
                None => Err(MarketError::not_found(format!(
                    "상품 {}",
                    transition.product_id
                ))),
            };
        };

        insert_notifications_tx(&mut tx, transition.notifications, transition.at).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_product(
        &self,
        id: i64,
        notifications: Vec<NewNotification>,
        at: DateTime<Utc>,
    ) -> MarketResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query(queries::DELETE_PRODUCT)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;
        if !deleted {
            tx.rollback().await?;
            return Ok(false);
        }
        insert_notifications_tx(&mut tx, notifications, at).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn insert_report(&self, new: NewReport, at: DateTime<Utc>) -> MarketResult<Report> {
        Ok(sqlx::query_as::<_, Report>(queries::INSERT_REPORT)
            .bind(new.reporter_id)
            .bind(new.reported_user_id)
            .bind(new.level.as_str())
            .bind(&new.reason)
            .bind(&new.evidence_urls)
            .bind(ReportStatus::Pending.as_str())
            .bind(at)
            .fetch_one(&*self.pool)
            .await?)
    }

    async fn report(&self, id: i64) -> MarketResult<Option<Report>> {
        Ok(sqlx::query_as::<_, Report>(queries::GET_REPORT)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?)
    }

    async fn reports(&self, status: Option<ReportStatus>) -> MarketResult<Vec<Report>> {
        let reports = match status {
            Some(status) => {
                sqlx::query_as::<_, Report>(queries::GET_REPORTS_BY_STATUS)
                    .bind(status.as_str())
                    .fetch_all(&*self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Report>(queries::GET_ALL_REPORTS)
                    .fetch_all(&*self.pool)
                    .await?
            }
        };
        Ok(reports)
    }

    async fn commit_report(&self, decision: ReportDecision) -> MarketResult<Report> {
        let from: Vec<String> = decision.from.iter().map(|s| s.as_str().to_string()).collect();
        let resolved_at = (!decision.to.is_open()).then_some(decision.at);

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Report>(queries::UPDATE_REPORT_STATUS)
            .bind(decision.report_id)
            .bind(&from)
            .bind(decision.to.as_str())
            .bind(decision.reviewer_id)
            .bind(&decision.resolution_note)
            .bind(resolved_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(updated) = updated else {
            tx.rollback().await?;
            return match self.report(decision.report_id).await? {
                Some(report) => Err(MarketError::InvalidStatus(format!(
                    "신고 {}의 상태가 {}입니다.",
                    report.id, report.status
                ))),
                None => Err(MarketError::not_found(format!(
                    "신고 {}",
                    decision.report_id
                ))),
            };
        };

        // 제재는 신고 처리와 같은 트랜잭션에서 적용
        if let Some(sanction) = decision.sanction {
            if update_user_tx(&mut tx, &sanction).await?.is_none() {
                tx.rollback().await?;
                return Err(MarketError::VersionConflict);
            }
            insert_notifications_tx(&mut tx, sanction.notifications, decision.at).await?;
        }

        insert_notifications_tx(&mut tx, decision.notifications, decision.at).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn notifications(&self, user_id: i64) -> MarketResult<Vec<Notification>> {
        Ok(
            sqlx::query_as::<_, Notification>(queries::GET_USER_NOTIFICATIONS)
                .bind(user_id)
                .fetch_all(&*self.pool)
                .await?,
        )
    }

    async fn mark_notification_read(
        &self,
        id: i64,
        user_id: i64,
    ) -> MarketResult<Option<Notification>> {
        Ok(
            sqlx::query_as::<_, Notification>(queries::MARK_NOTIFICATION_READ)
                .bind(id)
                .bind(user_id)
                .fetch_optional(&*self.pool)
                .await?,
        )
    }

    async fn events(&self, aggregate_id: i64) -> MarketResult<Vec<Event>> {
        Ok(sqlx::query_as::<_, Event>(queries::GET_EVENTS)
            .bind(aggregate_id)
            .fetch_all(&*self.pool)
            .await?)
    }

    async fn unpublished_events(&self, limit: i64) -> MarketResult<Vec<Event>> {
        Ok(sqlx::query_as::<_, Event>(queries::GET_UNPUBLISHED_EVENTS)
            .bind(limit)
            .fetch_all(&*self.pool)
            .await?)
    }

    async fn mark_event_published(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()> {
        sqlx::query(queries::MARK_EVENT_PUBLISHED)
            .bind(id)
            .bind(at)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn unpublished_notifications(&self, limit: i64) -> MarketResult<Vec<Notification>> {
        Ok(
            sqlx::query_as::<_, Notification>(queries::GET_UNPUBLISHED_NOTIFICATIONS)
                .bind(limit)
                .fetch_all(&*self.pool)
                .await?,
        )
    }

    async fn mark_notification_published(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()> {
        sqlx::query(queries::MARK_NOTIFICATION_PUBLISHED)
            .bind(id)
            .bind(at)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}
// endregion: --- Postgres Store
