// Core type definitions shared by the auction engine

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

// === TYPE ALIASES ===

/// Integer price. Signed so the `min_price - 1` bid sentinel and losing
/// trades (negative profit) are representable.
pub type Price = i64;

// === NEWTYPE IDS ===

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TraderId(pub u32);

impl TraderId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

// === ROLES ===

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    pub fn is_buyer(self) -> bool {
        matches!(self, Role::Buyer)
    }

    /// Single-letter prefix used in trader names ("b0", "s3").
    pub fn prefix(self) -> char {
        match self {
            Role::Buyer => 'b',
            Role::Seller => 's',
        }
    }
}

// === PRICE BOUNDS ===

/// Inclusive global price range `[min, max]` for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBounds {
    min: Price,
    max: Price,
}

impl PriceBounds {
    /// Rejects `min > max` and ranges touching `Price::MIN`/`Price::MAX`,
    /// which leave no room for the quote sentinels.
    pub fn new(min: Price, max: Price) -> Result<Self, MarketError> {
        let room = min.checked_sub(1).is_some() && max.checked_add(1).is_some();
        if min > max || !room {
            return Err(MarketError::InvalidPriceBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Price {
        self.min
    }

    pub fn max(&self) -> Price {
        self.max
    }

    pub fn contains(&self, price: Price) -> bool {
        (self.min..=self.max).contains(&price)
    }

    /// Best-bid value before any bid has been made; every legal bid beats it.
    pub fn bid_sentinel(&self) -> Price {
        self.min - 1
    }

    /// Best-ask value before any ask has been made; every legal ask beats it.
    pub fn ask_sentinel(&self) -> Price {
        self.max + 1
    }
}
