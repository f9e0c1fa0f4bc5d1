use crate::types::{Price, PriceBounds, Role};

// === QUOTE BOOK ===
//
// Period-scoped best bid / best ask plus who made them. Only an improving
// quote replaces the standing one. When the book crosses, the trade happens
// at the standing quote of the side that was just crossed, i.e. the earlier
// mover's price is honored, and the book goes back to idle.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookPhase {
    /// No standing quotes (period start, or just after a trade).
    Idle,
    /// A bid stands, no ask yet.
    BidStanding,
    /// An ask stands, no bid yet.
    AskStanding,
    /// Both sides stand and `best_bid < best_ask`.
    TwoSided,
    /// Both sides stand and `best_bid >= best_ask`; a trade is due.
    Crossed,
}

/// A trade the book is ready to execute. Trader handles are indices into
/// the period's state slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crossing {
    pub bidder: usize,
    pub seller: usize,
    pub bid: Price,
    pub ask: Price,
    pub price: Price,
}

#[derive(Clone, Debug)]
pub struct QuoteBook {
    bounds: PriceBounds,
    best_bid: Price,
    best_ask: Price,
    last_bidder: Option<usize>,
    last_seller: Option<usize>,
    /// Standing quote of the opposite side at the moment of the last improvement.
    pending_price: Option<Price>,
}

impl QuoteBook {
    pub fn new(bounds: PriceBounds) -> Self {
        Self {
            bounds,
            best_bid: bounds.bid_sentinel(),
            best_ask: bounds.ask_sentinel(),
            last_bidder: None,
            last_seller: None,
            pending_price: None,
        }
    }

    pub fn best_bid(&self) -> Price {
        self.best_bid
    }

    pub fn best_ask(&self) -> Price {
        self.best_ask
    }

    pub fn phase(&self) -> BookPhase {
        match (self.last_bidder, self.last_seller) {
            (None, None) => BookPhase::Idle,
            (Some(_), None) => BookPhase::BidStanding,
            (None, Some(_)) => BookPhase::AskStanding,
            (Some(_), Some(_)) if self.best_bid >= self.best_ask => BookPhase::Crossed,
            (Some(_), Some(_)) => BookPhase::TwoSided,
        }
    }

    /// Offer a quote from `trader`. Returns true if it became the standing
    /// quote for its side.
    pub fn submit(&mut self, role: Role, trader: usize, offer: Price) -> bool {
        match role {
            Role::Buyer if offer > self.best_bid => {
                self.best_bid = offer;
                self.pending_price = Some(self.best_ask);
                self.last_bidder = Some(trader);
                true
            }
            Role::Seller if offer < self.best_ask => {
                self.best_ask = offer;
                self.pending_price = Some(self.best_bid);
                self.last_seller = Some(trader);
                true
            }
            _ => false,
        }
    }

    /// If the book is crossed, return the trade and reset to idle.
    pub fn take_crossing(&mut self) -> Option<Crossing> {
        if self.phase() != BookPhase::Crossed {
            return None;
        }
        let crossing = Crossing {
            bidder: self.last_bidder?,
            seller: self.last_seller?,
            bid: self.best_bid,
            ask: self.best_ask,
            price: self.pending_price?,
        };
        self.reset();
        Some(crossing)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.bounds);
    }
}
