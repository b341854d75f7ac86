//! Venue-agnostic domain types: identifiers, quotes, snapshots,
//! opportunities, profit math, and trade records.

mod ids;
mod money;
mod opportunity;
mod profit;
mod quote;
mod trade;

pub use ids::{Instrument, VenueId};
pub use money::{Price, Quantity};
pub use opportunity::Opportunity;
pub use profit::{net_spread_pct, ProfitBreakdown};
pub use quote::{PriceSnapshot, Quote};
pub use trade::{LegFill, TradeRecord, TradeStatus};
