/// 조회 모델
/// 경매 조회 응답에는 저장된 상태와 함께 현재 시각으로 판정한 단계가 실린다.
// region:    --- Imports
use crate::auction::status::AuctionPhase;
use crate::bidding::model::Auction;
use chrono::{DateTime, Utc};
use serde::Serialize;

// endregion: --- Imports

pub mod handlers;

// region:    --- Views
#[derive(Debug, Clone, Serialize)]
pub struct AuctionView {
    #[serde(flatten)]
    pub auction: Auction,
    pub phase: AuctionPhase,
    pub minimum_bid: i64,
}

impl AuctionView {
    pub fn at(auction: Auction, now: DateTime<Utc>) -> Self {
        Self {
            phase: auction.phase(now),
            minimum_bid: auction.minimum_bid(),
            auction,
        }
    }
}

/// 최고 입찰 (입찰이 없으면 금액과 입찰자가 비어 있다)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HighestBid {
    pub auction_id: i64,
    pub amount: Option<i64>,
    pub bidder_id: Option<i64>,
}
// endregion: --- Views
