/// 경매 등록과 종료
/// 종료 처리는 스케줄러만 수행하며, 입찰과 같은 version 조건부 쓰기를 사용한다.
// region:    --- Imports
use super::events::AuctionEvent;
use super::status::AuctionStatus;
use crate::bidding::model::{Auction, AuctionMutation, NewAuction};
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::notifications::{NewNotification, NotificationKind};
use crate::users::require_user;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Create
/// 경매 등록 (승인 대기 상태로 생성)
pub async fn create_auction(
    store: &dyn Store,
    clock: &dyn Clock,
    new: NewAuction,
) -> MarketResult<Auction> {
    info!(
        "{:<12} --> 경매 등록 요청 seller: {}, starting_price: {}",
        "Auction", new.seller_id, new.starting_price
    );
    validate(&new)?;

    let now = clock.now();
    let seller = require_user(store, new.seller_id).await?;
    if !seller.eligibility(now).can_sell {
        return Err(MarketError::Ineligible(format!(
            "사용자 {}는 판매할 수 없습니다. (신뢰도: {})",
            seller.id, seller.trust_score
        )));
    }

    store.insert_auction(new, now).await
}

fn validate(new: &NewAuction) -> MarketResult<()> {
    if new.title.trim().is_empty() {
        return Err(MarketError::Validation("경매 제목이 비어 있습니다.".to_string()));
    }
    if new.starting_price <= 0 {
        return Err(MarketError::Validation(format!(
            "시작가는 0보다 커야 합니다: {}",
            new.starting_price
        )));
    }
    if new.bid_increment <= 0 {
        return Err(MarketError::Validation(format!(
            "입찰 단위는 0보다 커야 합니다: {}",
            new.bid_increment
        )));
    }
    if new.end_time <= new.start_time {
        return Err(MarketError::Validation(
            "종료 시각은 시작 시각 이후여야 합니다.".to_string(),
        ));
    }
    if let Some(buy_now_price) = new.buy_now_price {
        if buy_now_price <= new.starting_price {
            return Err(MarketError::Validation(format!(
                "즉시 구매가는 시작가보다 커야 합니다: {buy_now_price}"
            )));
        }
    }
    Ok(())
}
// endregion: --- Create

// region:    --- Close
/// 종료 변경 생성 (판매자와 낙찰자에게 알림)
pub fn plan_close(auction: &Auction, now: DateTime<Utc>) -> AuctionMutation {
    let event = AuctionEvent::AuctionEnded {
        auction_id: auction.id,
        winner_id: auction.highest_bidder_id,
        final_price: auction.current_bid,
        timestamp: now,
    };
    let mut mutation = AuctionMutation::on(auction, event, now);
    mutation.status = AuctionStatus::Ended;

    let seller_body = match auction.highest_bidder_id {
        Some(_) => format!(
            "'{}' 경매가 {}원에 낙찰되었습니다.",
            auction.title, auction.current_bid
        ),
        None => format!("'{}' 경매가 입찰 없이 종료되었습니다.", auction.title),
    };
    mutation.notifications.push(
        NewNotification::new(
            auction.seller_id,
            NotificationKind::AuctionEnded,
            "경매 종료",
            seller_body,
        )
        .about(auction.id),
    );

    if let Some(winner) = auction.highest_bidder_id {
        mutation.notifications.push(
            NewNotification::new(
                winner,
                NotificationKind::AuctionWon,
                "낙찰",
                format!(
                    "'{}' 경매를 {}원에 낙찰받았습니다.",
                    auction.title, auction.current_bid
                ),
            )
            .about(auction.id),
        );
    }

    mutation
}

/// 종료 시각이 지난 경매 종료 처리
/// 입찰과 충돌한 경매는 다음 주기에 다시 시도된다.
pub async fn close_expired_auctions(store: &dyn Store, clock: &dyn Clock) -> MarketResult<usize> {
    let now = clock.now();
    let mut closed = 0;

    for auction in store.auctions_due_to_end(now).await? {
        match store.commit_auction(plan_close(&auction, now)).await {
            Ok(ended) => {
                info!(
                    "{:<12} --> 경매 종료: id={}, winner={:?}, final_price={}",
                    "Auction", ended.id, ended.highest_bidder_id, ended.current_bid
                );
                closed += 1;
            }
            Err(MarketError::VersionConflict) => {
                warn!(
                    "{:<12} --> 경매 {} 종료 중 버전 충돌: 다음 주기에 재시도",
                    "Auction", auction.id
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(closed)
}
// endregion: --- Close
