/// 저장소
/// 상태 변경과 그에 따른 이벤트/알림 기록은 메서드 하나가 한 트랜잭션으로 처리한다.
/// 조건부 쓰기가 실패하면 `MarketError::VersionConflict` 를 돌려준다.
// region:    --- Imports
use crate::bidding::model::{Auction, AuctionMutation, Bid, NewAuction};
use crate::error::MarketResult;
use crate::event_store::Event;
use crate::notifications::{NewNotification, Notification};
use crate::products::{NewProduct, Product, ProductStatus, ProductTransition};
use crate::reports::{NewReport, Report, ReportDecision, ReportStatus};
use crate::users::{NewUser, User, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
mod queries;

// endregion: --- Modules

// region:    --- Store Trait
#[async_trait]
pub trait Store: Send + Sync {
    // 사용자
    async fn insert_user(&self, new: NewUser, at: DateTime<Utc>) -> MarketResult<User>;
    async fn user(&self, id: i64) -> MarketResult<Option<User>>;
    async fn update_user(&self, update: UserUpdate, at: DateTime<Utc>) -> MarketResult<User>;
    /// 기간이 끝났지만 아직 정지 표시가 남은 사용자
    async fn users_with_expired_suspension(&self, now: DateTime<Utc>) -> MarketResult<Vec<User>>;
    /// `since` 이후 회복을 받지 않은 신뢰도 100 미만 사용자 (영구 정지 제외)
    async fn users_due_recovery(&self, since: DateTime<Utc>) -> MarketResult<Vec<User>>;

    // 경매
    async fn insert_auction(&self, new: NewAuction, at: DateTime<Utc>) -> MarketResult<Auction>;
    async fn auction(&self, id: i64) -> MarketResult<Option<Auction>>;
    async fn auctions(&self) -> MarketResult<Vec<Auction>>;
    /// 종료 시각이 지난 ACTIVE 경매
    async fn auctions_due_to_end(&self, now: DateTime<Utc>) -> MarketResult<Vec<Auction>>;
    async fn bids(&self, auction_id: i64) -> MarketResult<Vec<Bid>>;
    async fn commit_auction(&self, mutation: AuctionMutation) -> MarketResult<Auction>;

    // 상품
    async fn insert_product(&self, new: NewProduct, at: DateTime<Utc>) -> MarketResult<Product>;
    async fn product(&self, id: i64) -> MarketResult<Option<Product>>;
    async fn products(&self, status: Option<ProductStatus>) -> MarketResult<Vec<Product>>;
    async fn transition_product(&self, transition: ProductTransition) -> MarketResult<Product>;
    async fn delete_product(
        &self,
        id: i64,
        notifications: Vec<NewNotification>,
        at: DateTime<Utc>,
    ) -> MarketResult<bool>;

    // 신고
    async fn insert_report(&self, new: NewReport, at: DateTime<Utc>) -> MarketResult<Report>;
    async fn report(&self, id: i64) -> MarketResult<Option<Report>>;
    async fn reports(&self, status: Option<ReportStatus>) -> MarketResult<Vec<Report>>;
    async fn commit_report(&self, decision: ReportDecision) -> MarketResult<Report>;

    // 알림 / 아웃박스
    async fn notifications(&self, user_id: i64) -> MarketResult<Vec<Notification>>;
    async fn mark_notification_read(
        &self,
        id: i64,
        user_id: i64,
    ) -> MarketResult<Option<Notification>>;
    async fn events(&self, aggregate_id: i64) -> MarketResult<Vec<Event>>;
    async fn unpublished_events(&self, limit: i64) -> MarketResult<Vec<Event>>;
    async fn mark_event_published(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()>;
    async fn unpublished_notifications(&self, limit: i64) -> MarketResult<Vec<Notification>>;
    async fn mark_notification_published(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()>;
}
// endregion: --- Store Trait
