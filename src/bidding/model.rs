use crate::auction::events::AuctionEvent;
use crate::auction::status::{AuctionPhase, AuctionStatus};
use crate::notifications::NewNotification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub current_bid: i64,
    /// 생성 후 변경 불가
    pub bid_increment: i64,
    pub buy_now_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: AuctionStatus,
    pub bid_count: i64,
    pub highest_bidder_id: Option<i64>,
    /// 경매에 적용된 변경의 일련번호 (조건부 쓰기 기준)
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auction {
    pub fn phase(&self, now: DateTime<Utc>) -> AuctionPhase {
        AuctionPhase::evaluate(self.status, self.start_time, self.end_time, now)
    }

    /// 다음 입찰이 넘어야 하는 최소 금액
    pub fn minimum_bid(&self) -> i64 {
        self.current_bid.saturating_add(self.bid_increment)
    }
}

// 입찰 모델
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    /// 입찰이 반영된 경매 version
    pub sequence: i64,
    pub placed_at: DateTime<Utc>,
}

/// 경매 등록 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub seller_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub starting_price: i64,
    pub bid_increment: i64,
    pub buy_now_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// 저장 전 입찰
#[derive(Debug, Clone, PartialEq)]
pub struct NewBid {
    pub bidder_id: i64,
    pub amount: i64,
}

/// 경매 변경
/// 저장소는 `expected_version` 이 현재 version 과 같을 때만 한 트랜잭션으로
/// 경매 갱신, 입찰 기록, 이벤트 추가, 알림 기록을 수행한다.
#[derive(Debug, Clone)]
pub struct AuctionMutation {
    pub auction_id: i64,
    pub expected_version: i64,
    pub current_bid: i64,
    pub bid_count: i64,
    pub highest_bidder_id: Option<i64>,
    pub status: AuctionStatus,
    pub bid: Option<NewBid>,
    pub event: AuctionEvent,
    pub notifications: Vec<NewNotification>,
    pub at: DateTime<Utc>,
}

impl AuctionMutation {
    /// 현재 상태를 유지하는 변경 (필드를 바꿔서 사용)
    pub fn on(auction: &Auction, event: AuctionEvent, at: DateTime<Utc>) -> Self {
        Self {
            auction_id: auction.id,
            expected_version: auction.version,
            current_bid: auction.current_bid,
            bid_count: auction.bid_count,
            highest_bidder_id: auction.highest_bidder_id,
            status: auction.status,
            bid: None,
            event,
            notifications: Vec::new(),
            at,
        }
    }
}
