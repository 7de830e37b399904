// region:    --- Imports
use super::{AuctionView, HighestBid};
use crate::bidding::model::{Auction, Bid};
use crate::clock::Clock;
use crate::database::Store;
use crate::error::{MarketError, MarketResult};
use crate::users::{require_user, UserView};
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

async fn require_auction(store: &dyn Store, auction_id: i64) -> MarketResult<Auction> {
    store
        .auction(auction_id)
        .await?
        .ok_or_else(|| MarketError::not_found(format!("경매 {auction_id}")))
}

/// 경매 상태 조회
pub async fn get_auction_state(
    store: &dyn Store,
    clock: &dyn Clock,
    auction_id: i64,
) -> MarketResult<AuctionView> {
    info!("{:<12} --> 경매 상태 조회 id: {}", "Query", auction_id);
    let auction = require_auction(store, auction_id).await?;
    Ok(AuctionView::at(auction, clock.now()))
}

/// 모든 경매 조회
pub async fn get_all_auctions(
    store: &dyn Store,
    clock: &dyn Clock,
) -> MarketResult<Vec<AuctionView>> {
    info!("{:<12} --> 모든 경매 조회", "Query");
    let now = clock.now();
    Ok(store
        .auctions()
        .await?
        .into_iter()
        .map(|auction| AuctionView::at(auction, now))
        .collect())
}

/// 최고 입찰가 조회
pub async fn get_highest_bid(store: &dyn Store, auction_id: i64) -> MarketResult<HighestBid> {
    info!("{:<12} --> 최고 입찰가 조회 id: {}", "Query", auction_id);
    let auction = require_auction(store, auction_id).await?;
    let placed = auction.bid_count > 0;
    Ok(HighestBid {
        auction_id,
        amount: placed.then_some(auction.current_bid),
        bidder_id: auction.highest_bidder_id,
    })
}

/// 입찰 이력 조회 (최신순)
pub async fn get_bid_history(store: &dyn Store, auction_id: i64) -> MarketResult<Vec<Bid>> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", auction_id);
    require_auction(store, auction_id).await?;
    store.bids(auction_id).await
}

/// 사용자 조회 (거래 자격 포함)
pub async fn get_user(store: &dyn Store, clock: &dyn Clock, user_id: i64) -> MarketResult<UserView> {
    info!("{:<12} --> 사용자 조회 id: {}", "Query", user_id);
    let user = require_user(store, user_id).await?;
    Ok(UserView::at(user, clock.now()))
}

// endregion: --- Query Handlers
