//! Traders and their period-scoped state.
//!
//! `Trader` is the part that never changes during a run: identity, role,
//! constraint mode and schedule. `TraderState` is the disposable record a
//! period mutates; a new one is derived for every period and points back at
//! the same `Trader`.

use serde::{Deserialize, Serialize};

use crate::schedule::ValuationSchedule;
use crate::types::{Price, Role, TraderId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trader {
    pub id: TraderId,
    pub name: String,
    pub role: Role,
    /// Constrained traders never quote a price that would make them lose money.
    pub constrained: bool,
    pub schedule: ValuationSchedule,
}

impl Trader {
    pub fn new(
        id: TraderId,
        name: impl Into<String>,
        role: Role,
        constrained: bool,
        schedule: ValuationSchedule,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            constrained,
            schedule,
        }
    }

    pub fn buyer(id: u32, values: impl IntoIterator<Item = Price>, constrained: bool) -> Self {
        Self::new(
            TraderId::new(id),
            format!("b{id}"),
            Role::Buyer,
            constrained,
            ValuationSchedule::for_role(Role::Buyer, values),
        )
    }

    pub fn seller(id: u32, values: impl IntoIterator<Item = Price>, constrained: bool) -> Self {
        Self::new(
            TraderId::new(id),
            format!("s{id}"),
            Role::Seller,
            constrained,
            ValuationSchedule::for_role(Role::Seller, values),
        )
    }

    pub fn is_buyer(&self) -> bool {
        self.role.is_buyer()
    }

    /// Copy of this trader with a different constraint mode, sharing the schedule.
    pub fn with_constrained(&self, constrained: bool) -> Self {
        Self {
            constrained,
            ..self.clone()
        }
    }

    /// Fresh period state: nothing traded, no profits, no standing offer.
    pub fn fresh_state(&self) -> TraderState<'_> {
        TraderState {
            trader: self,
            profits: Vec::with_capacity(self.schedule.units()),
            current_offer: None,
        }
    }
}

/// Mutable per-period record for one trader.
///
/// `units_traded()` is always `profits.len()`, so the two can never drift.
#[derive(Clone, Debug)]
pub struct TraderState<'a> {
    trader: &'a Trader,
    profits: Vec<Price>,
    current_offer: Option<Price>,
}

impl<'a> TraderState<'a> {
    pub fn trader(&self) -> &'a Trader {
        self.trader
    }

    pub fn role(&self) -> Role {
        self.trader.role
    }

    pub fn units_traded(&self) -> usize {
        self.profits.len()
    }

    pub fn profits(&self) -> &[Price] {
        &self.profits
    }

    pub fn current_offer(&self) -> Option<Price> {
        self.current_offer
    }

    pub fn is_exhausted(&self) -> bool {
        self.units_traded() >= self.trader.schedule.units()
    }

    /// Value of the next unit to trade, `None` once exhausted.
    pub fn current_unit_value(&self) -> Option<Price> {
        self.trader.schedule.unit_value(self.units_traded())
    }

    pub(crate) fn set_offer(&mut self, offer: Price) {
        self.current_offer = Some(offer);
    }

    /// Settle one unit at `price` and return the profit booked for it.
    ///
    /// Returns `None` without touching state if the trader is exhausted.
    pub fn transact(&mut self, price: Price) -> Option<Price> {
        let value = self.current_unit_value()?;
        let profit = match self.trader.role {
            Role::Buyer => value - price,
            Role::Seller => price - value,
        };
        self.profits.push(profit);
        self.current_offer = None;
        Some(profit)
    }

    /// Consume the state, keeping only the profit history.
    pub fn into_profits(self) -> Vec<Price> {
        self.profits
    }
}
