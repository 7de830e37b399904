use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 경매 승인 이벤트
    AuctionApproved {
        auction_id: i64,
        moderator_id: i64,
        timestamp: DateTime<Utc>,
    },
    // 입찰 이벤트
    BidPlaced {
        auction_id: i64,
        bidder_id: i64,
        bid_amount: i64,
        timestamp: DateTime<Utc>,
    },
    // 즉시 구매 이벤트
    BuyNowExecuted {
        auction_id: i64,
        buyer_id: i64,
        price: i64,
        timestamp: DateTime<Utc>,
    },
    // 경매 종료 이벤트
    AuctionEnded {
        auction_id: i64,
        winner_id: Option<i64>,
        final_price: i64,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionApproved { .. } => "AuctionApproved",
            AuctionEvent::BidPlaced { .. } => "BidPlaced",
            AuctionEvent::BuyNowExecuted { .. } => "BuyNowExecuted",
            AuctionEvent::AuctionEnded { .. } => "AuctionEnded",
        }
    }
}

