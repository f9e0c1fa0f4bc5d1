//! Zero-intelligence offer generation.
//!
//! Quotes are drawn uniformly from the integers a trader is allowed to name:
//! - constrained buyer: `[min_price, unit_value]`
//! - constrained seller: `[unit_value, max_price]`
//! - unconstrained (either role): `[min_price, max_price]`

use std::ops::RangeInclusive;

use rand::Rng;

use crate::trader::TraderState;
use crate::types::{Price, PriceBounds, Role};

/// Range of prices `state` may quote for its next unit.
///
/// A constrained trader whose unit value lies outside the global bounds is
/// clamped back into them so the range is never empty.
///
/// # Panics
/// If the trader is exhausted.
pub fn offer_range(state: &TraderState<'_>, bounds: PriceBounds) -> RangeInclusive<Price> {
    let value = state
        .current_unit_value()
        .expect("offer requested from an exhausted trader");
    let value = value.clamp(bounds.min(), bounds.max());

    match (state.trader().constrained, state.role()) {
        (true, Role::Buyer) => bounds.min()..=value,
        (true, Role::Seller) => value..=bounds.max(),
        (false, _) => bounds.min()..=bounds.max(),
    }
}

/// Draw the trader's next quote and record it as its current offer.
///
/// Callers must never pass an exhausted trader; the clearing loop filters
/// them out before selection.
pub fn generate_offer<R: Rng>(
    state: &mut TraderState<'_>,
    bounds: PriceBounds,
    rng: &mut R,
) -> Price {
    let offer = rng.random_range(offer_range(state, bounds));
    state.set_offer(offer);
    offer
}
