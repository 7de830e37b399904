/// 메모리 저장소
/// 하나의 뮤텍스 아래에서 모든 변경을 처리하므로 메서드 단위로 원자적이다.
/// 테스트와 DATABASE_URL 없는 개발 실행에 사용한다.
// region:    --- Imports
use super::Store;
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
use std::collections::BTreeMap;
use tokio::sync::Mutex;

// endregion: --- Imports

// region:    --- Memory Store
#[derive(Default)]
struct MemoryState {
    last_id: i64,
    users: BTreeMap<i64, User>,
    auctions: BTreeMap<i64, Auction>,
    bids: Vec<Bid>,
    events: Vec<Event>,
    products: BTreeMap<i64, Product>,
    reports: BTreeMap<i64, Report>,
    notifications: BTreeMap<i64, Notification>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn push_notifications(&mut self, notifications: Vec<NewNotification>, at: DateTime<Utc>) {
        for new in notifications {
            let id = self.next_id();
            self.notifications.insert(
                id,
                Notification {
                    id,
                    user_id: new.user_id,
                    kind: new.kind,
                    title: new.title,
                    body: new.body,
                    reference_id: new.reference_id,
                    read: false,
                    published_at: None,
                    created_at: at,
                },
            );
        }
    }

    /// 사용자 version 확인만 수행 (적용은 `apply_user_update`)
    fn check_user_update(&self, update: &UserUpdate) -> MarketResult<()> {
        let user = self
            .users
            .get(&update.user_id)
            .ok_or_else(|| MarketError::not_found(format!("사용자 {}", update.user_id)))?;
        if user.version != update.expected_version {
            return Err(MarketError::VersionConflict);
        }
        Ok(())
    }

    fn apply_user_update(&mut self, update: UserUpdate, at: DateTime<Utc>) -> MarketResult<User> {
        self.check_user_update(&update)?;
        let user = self
            .users
            .get_mut(&update.user_id)
            .ok_or_else(|| MarketError::not_found(format!("사용자 {}", update.user_id)))?;
        user.trust_score = update.trust_score;
        user.suspended = update.suspended;
        user.suspension_reason = update.suspension_reason;
        user.suspended_until = update.suspended_until;
        user.last_recovery_at = update.last_recovery_at;
        user.version += 1;
        let updated = user.clone();
        self.push_notifications(update.notifications, at);
        Ok(updated)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, new: NewUser, at: DateTime<Utc>) -> MarketResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == new.email) {
            return Err(MarketError::Validation(format!(
                "이미 가입된 이메일입니다: {}",
                new.email
            )));
        }
        let id = state.next_id();
        let user = User {
            id,
            display_name: new.display_name,
            email: new.email,
            role: new.role,
            trust_score: INITIAL_TRUST_SCORE,
            suspended: false,
            suspension_reason: None,
            suspended_until: None,
            last_recovery_at: None,
            version: 0,
            created_at: at,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: i64) -> MarketResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn update_user(&self, update: UserUpdate, at: DateTime<Utc>) -> MarketResult<User> {
        self.state.lock().await.apply_user_update(update, at)
    }

    async fn users_with_expired_suspension(&self, now: DateTime<Utc>) -> MarketResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.suspended && u.suspended_until.is_some_and(|until| until <= now))
            .cloned()
            .collect())
    }

    async fn users_due_recovery(&self, since: DateTime<Utc>) -> MarketResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| {
                u.trust_score < crate::trust::MAX_TRUST_SCORE
                    && !u.is_permanently_suspended()
                    && u.last_recovery_at.map_or(true, |last| last < since)
            })
            .cloned()
            .collect())
    }

    async fn insert_auction(&self, new: NewAuction, at: DateTime<Utc>) -> MarketResult<Auction> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let auction = Auction {
            id,
            seller_id: new.seller_id,
            title: new.title,
            description: new.description,
            starting_price: new.starting_price,
            current_bid: new.starting_price,
            bid_increment: new.bid_increment,
            buy_now_price: new.buy_now_price,
            start_time: new.start_time,
            end_time: new.end_time,
            status: AuctionStatus::Pending,
            bid_count: 0,
            highest_bidder_id: None,
            version: 0,
            created_at: at,
            updated_at: at,
        };
        state.auctions.insert(id, auction.clone());
        Ok(auction)
    }

    async fn auction(&self, id: i64) -> MarketResult<Option<Auction>> {
        Ok(self.state.lock().await.auctions.get(&id).cloned())
    }

    async fn auctions(&self) -> MarketResult<Vec<Auction>> {
        let state = self.state.lock().await;
        Ok(state.auctions.values().rev().cloned().collect())
    }

    async fn auctions_due_to_end(&self, now: DateTime<Utc>) -> MarketResult<Vec<Auction>> {
        let state = self.state.lock().await;
        Ok(state
            .auctions
            .values()
            .filter(|a| a.status == AuctionStatus::Active && a.end_time < now)
            .cloned()
            .collect())
    }

    async fn bids(&self, auction_id: i64) -> MarketResult<Vec<Bid>> {
        let state = self.state.lock().await;
        let mut bids: Vec<Bid> = state
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(bids)
    }

    async fn commit_auction(&self, mutation: AuctionMutation) -> MarketResult<Auction> {
        let data = serde_json::to_value(&mutation.event)?;
        let mut state = self.state.lock().await;
        let current = state
            .auctions
            .get(&mutation.auction_id)
            .cloned()
            .ok_or_else(|| MarketError::not_found(format!("경매 {}", mutation.auction_id)))?;
        if current.version != mutation.expected_version {
            return Err(MarketError::VersionConflict);
        }

        let version = current.version + 1;
        let updated = Auction {
            current_bid: mutation.current_bid,
            bid_count: mutation.bid_count,
            highest_bidder_id: mutation.highest_bidder_id,
            status: mutation.status,
            version,
            updated_at: mutation.at,
            ..current
        };

        if let Some(bid) = mutation.bid {
            let id = state.next_id();
            state.bids.push(Bid {
                id,
                auction_id: updated.id,
                bidder_id: bid.bidder_id,
                amount: bid.amount,
                sequence: version,
                placed_at: mutation.at,
            });
        }

        let event_id = state.next_id();
        state.events.push(Event {
            id: event_id,
            aggregate_id: updated.id,
            event_type: mutation.event.event_type().to_string(),
            data,
            timestamp: mutation.at,
            version,
            published_at: None,
        });
        state.push_notifications(mutation.notifications, mutation.at);
        state.auctions.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn insert_product(&self, new: NewProduct, at: DateTime<Utc>) -> MarketResult<Product> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let product = Product {
            id,
            seller_id: new.seller_id,
            title: new.title,
            description: new.description,
            price: new.price,
            status: ProductStatus::Pending,
            media_urls: new.media_urls,
            rejection_reason: None,
            created_at: at,
            updated_at: at,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn product(&self, id: i64) -> MarketResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn products(&self, status: Option<ProductStatus>) -> MarketResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .values()
            .rev()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect())
    }

    async fn transition_product(&self, transition: ProductTransition) -> MarketResult<Product> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(&transition.product_id)
            .ok_or_else(|| MarketError::not_found(format!("상품 {}", transition.product_id)))?;
        if product.status != transition.from {
            return Err(MarketError::InvalidStatus(format!(
                "상품 {}의 상태가 {}입니다.",
                product.id, product.status
            )));
        }
        product.status = transition.to;
        product.rejection_reason = transition.rejection_reason;
        product.updated_at = transition.at;
        let updated = product.clone();
        state.push_notifications(transition.notifications, transition.at);
        Ok(updated)
    }

    async fn delete_product(
        &self,
        id: i64,
        notifications: Vec<NewNotification>,
        at: DateTime<Utc>,
    ) -> MarketResult<bool> {
        let mut state = self.state.lock().await;
        if state.products.remove(&id).is_none() {
            return Ok(false);
        }
        state.push_notifications(notifications, at);
        Ok(true)
    }

    async fn insert_report(&self, new: NewReport, at: DateTime<Utc>) -> MarketResult<Report> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let report = Report {
            id,
            reporter_id: new.reporter_id,
            reported_user_id: new.reported_user_id,
            level: new.level,
            reason: new.reason,
            evidence_urls: new.evidence_urls,
            status: ReportStatus::Pending,
            reviewer_id: None,
            resolution_note: None,
            created_at: at,
            resolved_at: None,
        };
        state.reports.insert(id, report.clone());
        Ok(report)
    }

    async fn report(&self, id: i64) -> MarketResult<Option<Report>> {
        Ok(self.state.lock().await.reports.get(&id).cloned())
    }

    async fn reports(&self, status: Option<ReportStatus>) -> MarketResult<Vec<Report>> {
        let state = self.state.lock().await;
        Ok(state
            .reports
            .values()
            .rev()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect())
    }

    async fn commit_report(&self, decision: ReportDecision) -> MarketResult<Report> {
        let mut state = self.state.lock().await;
        let report = state
            .reports
            .get(&decision.report_id)
            .ok_or_else(|| MarketError::not_found(format!("신고 {}", decision.report_id)))?;
        if !decision.from.contains(&report.status) {
            return Err(MarketError::InvalidStatus(format!(
                "신고 {}의 상태가 {}입니다.",
                report.id, report.status
            )));
        }
        if let Some(sanction) = &decision.sanction {
            state.check_user_update(sanction)?;
        }

        if let Some(sanction) = decision.sanction {
            state.apply_user_update(sanction, decision.at)?;
        }
        let report = state
            .reports
            .get_mut(&decision.report_id)
            .ok_or_else(|| MarketError::not_found(format!("신고 {}", decision.report_id)))?;
        report.status = decision.to;
        report.reviewer_id = Some(decision.reviewer_id);
        if decision.resolution_note.is_some() {
            report.resolution_note = decision.resolution_note;
        }
        if !decision.to.is_open() {
            report.resolved_at = Some(decision.at);
        }
        let updated = report.clone();
        state.push_notifications(decision.notifications, decision.at);
        Ok(updated)
    }

    async fn notifications(&self, user_id: i64) -> MarketResult<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(
        &self,
        id: i64,
        user_id: i64,
    ) -> MarketResult<Option<Notification>> {
        let mut state = self.state.lock().await;
        Ok(state
            .notifications
            .get_mut(&id)
            .filter(|n| n.user_id == user_id)
            .map(|n| {
                n.read = true;
                n.clone()
            }))
    }

    async fn events(&self, aggregate_id: i64) -> MarketResult<Vec<Event>> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn unpublished_events(&self, limit: i64) -> MarketResult<Vec<Event>> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|e| e.published_at.is_none())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_event_published(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()> {
        let mut state = self.state.lock().await;
        if let Some(event) = state.events.iter_mut().find(|e| e.id == id) {
            event.published_at = Some(at);
        }
        Ok(())
    }

    async fn unpublished_notifications(&self, limit: i64) -> MarketResult<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .values()
            .filter(|n| n.published_at.is_none())
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_notification_published(&self, id: i64, at: DateTime<Utc>) -> MarketResult<()> {
        let mut state = self.state.lock().await;
        if let Some(notification) = state.notifications.get_mut(&id) {
            notification.published_at = Some(at);
        }
        Ok(())
    }
}
// endregion: --- Memory Store

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::events::AuctionEvent;
    use chrono::Duration;

    async fn active_auction(store: &MemoryStore) -> Auction {
        let now = Utc::now();
        let auction = store
            .insert_auction(
                NewAuction {
                    seller_id: 1,
                    title: "카메라".to_string(),
                    description: String::new(),
                    starting_price: 100,
                    bid_increment: 10,
                    buy_now_price: None,
                    start_time: now,
                    end_time: now + Duration::hours(1),
                },
                now,
            )
            .await
            .unwrap();
        let mut approve = AuctionMutation::on(
            &auction,
            AuctionEvent::AuctionApproved {
                auction_id: auction.id,
                moderator_id: 2,
                timestamp: now,
            },
            now,
        );
        approve.status = AuctionStatus::Active;
        store.commit_auction(approve).await.unwrap()
    }

    #[tokio::test]
    async fn stale_version_is_rejected_without_side_effects() {
        let store = MemoryStore::new();
        let auction = active_auction(&store).await;
        assert_eq!(auction.version, 1);

        let mut stale = AuctionMutation::on(
            &auction,
            AuctionEvent::BidPlaced {
                auction_id: auction.id,
                bidder_id: 3,
                bid_amount: 150,
                timestamp: Utc::now(),
            },
            Utc::now(),
        );
        stale.expected_version = 0;
        stale.current_bid = 150;

        let err = store.commit_auction(stale).await.unwrap_err();
        assert!(matches!(err, MarketError::VersionConflict));

        let unchanged = store.auction(auction.id).await.unwrap().unwrap();
        assert_eq!(unchanged.current_bid, 100);
        assert_eq!(store.events(auction.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .insert_user(NewUser::new("a", "same@example.com", crate::users::Role::User), now)
            .await
            .unwrap();
        let err = store
            .insert_user(NewUser::new("b", "same@example.com", crate::users::Role::User), now)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }
}
