/// 입찰 수락 규칙
/// 저장소에서 읽은 경매 스냅샷에 대해 판정하며, 실제 반영은 version 조건부 쓰기로 한다.
// region:    --- Imports
use super::model::{Auction, AuctionMutation, NewBid};
use crate::auction::events::AuctionEvent;
use crate::auction::status::{AuctionPhase, AuctionStatus};
use crate::error::{MarketError, MarketResult};
use crate::notifications::{NewNotification, NotificationKind};
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Rules
/// 입찰 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidDecision {
    /// 현재가 갱신
    Raise { amount: i64 },
    /// 즉시 구매가 이상 입찰: 즉시 구매가로 낙찰
    BuyNow { price: i64 },
}

impl BidDecision {
    pub fn amount(&self) -> i64 {
        match self {
            BidDecision::Raise { amount } => *amount,
            BidDecision::BuyNow { price } => *price,
        }
    }
}

pub fn evaluate_bid(
    auction: &Auction,
    bidder_id: i64,
    amount: i64,
    now: DateTime<Utc>,
) -> MarketResult<BidDecision> {
    match auction.phase(now) {
        AuctionPhase::Active => {}
        AuctionPhase::NotStarted => return Err(MarketError::NotStarted),
        AuctionPhase::Ended => return Err(MarketError::AlreadyEnded),
        AuctionPhase::Pending => {
            return Err(MarketError::InvalidStatus(format!(
                "경매 {}는 승인 대기 중입니다.",
                auction.id
            )))
        }
    }

    if bidder_id == auction.seller_id {
        return Err(MarketError::Forbidden(
            "판매자는 자신의 경매에 입찰할 수 없습니다.".to_string(),
        ));
    }

    if let Some(buy_now_price) = auction.buy_now_price {
        if amount >= buy_now_price {
            return Ok(BidDecision::BuyNow {
                price: buy_now_price,
            });
        }
    }

    let minimum = auction.minimum_bid();
    if amount <= auction.current_bid || amount < minimum {
        return Err(MarketError::LowBid {
            bid_amount: amount,
            minimum,
        });
    }

    Ok(BidDecision::Raise { amount })
}

/// 판정 결과를 경매 변경으로 변환
pub fn plan_bid(
    auction: &Auction,
    bidder_id: i64,
    decision: BidDecision,
    now: DateTime<Utc>,
) -> AuctionMutation {
    let event = match decision {
        BidDecision::Raise { amount } => AuctionEvent::BidPlaced {
            auction_id: auction.id,
            bidder_id,
            bid_amount: amount,
            timestamp: now,
        },
        BidDecision::BuyNow { price } => AuctionEvent::BuyNowExecuted {
            auction_id: auction.id,
            buyer_id: bidder_id,
            price,
            timestamp: now,
        },
    };

    let amount = decision.amount();
    let mut mutation = AuctionMutation::on(auction, event, now);
    mutation.current_bid = amount;
    mutation.bid_count = auction.bid_count + 1;
    mutation.highest_bidder_id = Some(bidder_id);
    mutation.bid = Some(NewBid { bidder_id, amount });

    if let Some(previous) = auction.highest_bidder_id.filter(|id| *id != bidder_id) {
        mutation.notifications.push(
            NewNotification::new(
                previous,
                NotificationKind::Outbid,
                "상위 입찰 발생",
                format!("'{}' 경매에 {}원 입찰이 들어왔습니다.", auction.title, amount),
            )
            .about(auction.id),
        );
    }

    if let BidDecision::BuyNow { price } = decision {
        mutation.status = AuctionStatus::Ended;
        mutation.notifications.push(
            NewNotification::new(
                bidder_id,
                NotificationKind::AuctionWon,
                "즉시 구매 완료",
                format!("'{}' 상품을 {}원에 낙찰받았습니다.", auction.title, price),
            )
            .about(auction.id),
        );
        mutation.notifications.push(
            NewNotification::new(
                auction.seller_id,
                NotificationKind::AuctionEnded,
                "즉시 구매로 경매 종료",
                format!("'{}' 경매가 {}원에 즉시 구매되었습니다.", auction.title, price),
            )
            .about(auction.id),
        );
    }

    mutation
}
// endregion: --- Rules
