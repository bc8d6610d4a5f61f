//! Human-readable alert texts (Telegram Markdown).

use rust_decimal::Decimal;

use crate::types::{AlertMode, Opportunity, WatchedEntry};

/// Instant mode: pattern confirmed and price already inside the gap.
pub fn instant_opportunity(opp: &Opportunity) -> String {
    format!(
        "🎯 *[SMC Sniper]* Potential buy setup\n\n\
         • *Symbol:* `{}`\n\
         • *Current price:* `{}`\n\n\
         • *Analysis:*\n\
         \u{20}\u{20}1- Structure broken above `{}`.\n\
         \u{20}\u{20}2- Unfilled FVG in the discount zone.\n\
         \u{20}\u{20}3- Entry zone: `{}` – `{}`, price is inside it now.",
        opp.symbol,
        opp.price_at_detection,
        opp.structure_break.reference_price,
        opp.gap.bottom,
        opp.gap.top,
    )
}

/// Deferred mode: opportunity parked on the watch-list.
pub fn watch_added(opp: &Opportunity) -> String {
    format!(
        "👀 *[SMC Sniper]* Watching `{}`\n\n\
         • Structure broken above `{}`\n\
         • Entry zone: `{}` – `{}`\n\
         • Price at detection: `{}`\n\n\
         Alert follows when price returns to the gap.",
        opp.symbol,
        opp.structure_break.reference_price,
        opp.gap.bottom,
        opp.gap.top,
        opp.price_at_detection,
    )
}

/// Deferred mode: price revisited the gap of a watched symbol.
pub fn entry_triggered(entry: &WatchedEntry, price: Decimal) -> String {
    format!(
        "🚀 *[SMC Sniper]* Entry signal\n\n\
         • *Symbol:* `{}`\n\
         • *Current price:* `{}`\n\
         • *Entry zone:* `{}` – `{}`\n\
         • Watched since {}",
        entry.symbol,
        price,
        entry.gap_bottom,
        entry.gap_top,
        entry.added_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

pub fn startup(name: &str, mode: AlertMode, price_ceiling: Decimal, top_n: usize) -> String {
    format!(
        "✅ *{name}* is running ({mode} mode).\n\
         Scanning the top {top_n} pairs by volume priced under ${price_ceiling}."
    )
}
