/// 입찰 관련 커맨드 처리
/// 1. 입찰
/// 2. 즉시 구매
/// 경매 스냅샷을 읽어 판정한 뒤 version 조건부 쓰기로 반영한다.
/// 다른 입찰이 먼저 반영되어 충돌하면 새 스냅샷으로 다시 판정하므로,
/// 밀린 입찰은 조용히 사라지지 않고 LOW_BID 등으로 거절된다.
// region:    --- Imports
use super::model::Auction;
use super::rules::{evaluate_bid, plan_bid, BidDecision};
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::users::require_user;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub bidder_id: i64,
    pub bid_amount: i64,
}

/// 즉시 구매 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BuyNowCommand {
    pub auction_id: i64,
    pub buyer_id: i64,
}

/// 입찰 반영 결과
#[derive(Debug, Serialize, Clone)]
pub struct BidReceipt {
    pub auction: Auction,
    pub accepted_amount: i64,
    pub buy_now: bool,
}

// 최대 재시도 횟수
pub const MAX_RETRIES: u32 = 100;

/// 1. 입찰
pub async fn handle_place_bid(
    store: &dyn Store,
    clock: &dyn Clock,
    cmd: PlaceBidCommand,
) -> MarketResult<BidReceipt> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    ensure_can_buy(store, clock, cmd.bidder_id).await?;
    commit_with_retry(store, clock, cmd.auction_id, cmd.bidder_id, |auction, now| {
        evaluate_bid(auction, cmd.bidder_id, cmd.bid_amount, now)
    })
    .await
}

/// 2. 즉시 구매(낙찰)
pub async fn handle_buy_now(
    store: &dyn Store,
    clock: &dyn Clock,
    cmd: BuyNowCommand,
) -> MarketResult<BidReceipt> {
    info!("{:<12} --> 즉시 구매 요청 처리 시작: {:?}", "Command", cmd);
    ensure_can_buy(store, clock, cmd.buyer_id).await?;
    commit_with_retry(store, clock, cmd.auction_id, cmd.buyer_id, |auction, now| {
        let price = auction.buy_now_price.ok_or(MarketError::NoBuyNow)?;
        evaluate_bid(auction, cmd.buyer_id, price, now)
    })
    .await
}

async fn ensure_can_buy(store: &dyn Store, clock: &dyn Clock, user_id: i64) -> MarketResult<()> {
    let user = require_user(store, user_id).await?;
    if !user.eligibility(clock.now()).can_buy {
        return Err(MarketError::Ineligible(format!(
            "사용자 {}는 구매할 수 없습니다. (신뢰도: {})",
            user.id, user.trust_score
        )));
    }
    Ok(())
}

/// 스냅샷 조회, 판정, 조건부 쓰기를 충돌이 없을 때까지 반복
async fn commit_with_retry<F>(
    store: &dyn Store,
    clock: &dyn Clock,
    auction_id: i64,
    bidder_id: i64,
    decide: F,
) -> MarketResult<BidReceipt>
where
    F: Fn(&Auction, chrono::DateTime<chrono::Utc>) -> MarketResult<BidDecision> + Send + Sync,
{
    for attempt in 1..=MAX_RETRIES {
        let auction = store
            .auction(auction_id)
            .await?
            .ok_or_else(|| MarketError::not_found(format!("경매 {auction_id}")))?;
        let now = clock.now();

        let decision = decide(&auction, now)?;
        let mutation = plan_bid(&auction, bidder_id, decision, now);

        match store.commit_auction(mutation).await {
            Ok(updated) => {
                info!(
                    "{:<12} --> 입찰 반영: auction={}, bidder={}, amount={}, version={}",
                    "Command",
                    updated.id,
                    bidder_id,
                    decision.amount(),
                    updated.version
                );
                return Ok(BidReceipt {
                    auction: updated,
                    accepted_amount: decision.amount(),
                    buy_now: matches!(decision, BidDecision::BuyNow { .. }),
                });
            }
            Err(MarketError::VersionConflict) => {
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도 ({}/{})",
                    "Command", attempt, MAX_RETRIES
                );
                tokio::task::yield_now().await;
            }
            Err(e) => return Err(e),
        }
    }

    Err(MarketError::MaxRetriesExceeded)
}
// endregion: --- Commands
