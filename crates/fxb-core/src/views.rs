//! Response rendering (Telegram HTML + keyboards).

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{
    catalog::{Category, PairCatalog},
    formatting::{bullet_list, escape_html},
    messaging::types::{InlineButton, InlineKeyboard, Reply},
    navigation::NavToken,
    security::RateLimitPolicy,
};

pub const BOT_NAME: &str = "Forex Pairs Bot";

pub const ACCESS_DENIED: &str = "⛔ <b>Access Denied</b>\n\n\
You are not authorized to use this bot.\n\
Please contact the administrator.";

pub const CATEGORY_NOT_FOUND: &str = "Category not found.";

pub const UNKNOWN_OPTION: &str = "Unknown option";

pub const INTERNAL_ERROR: &str =
    "⚠️ An error occurred while processing your request. Please try again later.";

fn button(label: &str, token: NavToken) -> InlineButton {
    InlineButton::new(label, token.as_str())
}

/// Major | Minor, Exotic | Random, All.
pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![
            button("💰 Major Pairs", NavToken::Category(Category::Major)),
            button("📊 Minor Pairs", NavToken::Category(Category::Minor)),
        ],
        vec![
            button("🌐 Exotic Pairs", NavToken::Category(Category::Exotic)),
            button("🎲 Random Pair", NavToken::Random),
        ],
        vec![button("📈 All Pairs", NavToken::All)],
    ])
}

pub fn back_to_menu() -> InlineKeyboard {
    InlineKeyboard::single(button("🔙 Back to Menu", NavToken::BackToMenu))
}

pub fn another_random() -> InlineKeyboard {
    InlineKeyboard::single(button("🎲 Get Another", NavToken::Random))
}

pub fn welcome(first_name: Option<&str>, policy: RateLimitPolicy) -> Reply {
    let name = first_name
        .map(|n| format!(", {}", escape_html(n)))
        .unwrap_or_default();
    let rate_line = if policy.enabled {
        "✓ Rate limiting enabled"
    } else {
        "✗ Rate limiting disabled"
    };

    let html = format!(
        "👋 <b>Welcome to {BOT_NAME}{name}!</b>\n\n\
🌍 <b>Available Commands:</b>\n\
• /start - Show this welcome message\n\
• /pairs - View all forex pairs by category\n\
• /major - Get major currency pairs\n\
• /minor - Get minor currency pairs\n\
• /exotic - Get exotic currency pairs\n\
• /random - Get a random forex pair suggestion\n\
• /stats - View bot statistics\n\
• /help - Get detailed help information\n\n\
🔒 <b>Security Features:</b>\n\
{rate_line}\n\
✓ Access control active\n\
✓ All requests logged\n\n\
Select a category below to get started!"
    );

    Reply::with_keyboard(html, main_menu())
}

pub fn menu() -> Reply {
    Reply::with_keyboard("Select a category:", main_menu())
}

pub fn all_pairs(catalog: &PairCatalog) -> Reply {
    let mut html = String::from("📊 <b>Forex Pairs by Category</b>\n\n");
    for (category, symbols) in catalog.categories() {
        html.push_str(&format!(
            "<b>{category} Pairs:</b>\n{}\n\n",
            bullet_list(symbols)
        ));
    }
    html.push_str(&format!("<i>Total pairs: {}</i>", catalog.total()));
    Reply::text(html)
}

/// `None` when the category has no pairs in this catalog.
pub fn category_pairs(catalog: &PairCatalog, category: Category) -> Option<Reply> {
    let symbols = catalog.symbols(category);
    if symbols.is_empty() {
        return None;
    }

    let html = format!(
        "<b>{category} Currency Pairs:</b>\n\n{}\n\n<i>Total: {} pairs</i>",
        bullet_list(symbols),
        symbols.len()
    );
    Some(Reply::with_keyboard(html, back_to_menu()))
}

pub fn random_pair(symbol: &str, category: Category, keyboard: InlineKeyboard) -> Reply {
    let html = format!(
        "🎲 <b>Random Pair Selection</b>\n\n\
Pair: <b>{}</b>\n\
Category: <i>{category}</i>\n\n\
Good luck with your trading! 📈",
        escape_html(symbol)
    );
    Reply::with_keyboard(html, keyboard)
}

pub fn no_pairs() -> Reply {
    Reply::text("No pairs available.")
}

pub fn stats(catalog: &PairCatalog, now: DateTime<Utc>) -> Reply {
    let mut html = String::from("📊 <b>Bot Statistics</b>\n\n");
    for (category, symbols) in catalog.categories() {
        html.push_str(&format!("{category} Pairs: {}\n", symbols.len()));
    }
    html.push_str(&format!(
        "Total Pairs: {}\n\n\
🕐 Server Time: {}\n\
✅ Bot Status: Online (Polling Mode)\n\
🔄 Mode: Long Polling",
        catalog.total(),
        now.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    Reply::text(html)
}

pub fn help(policy: RateLimitPolicy) -> Reply {
    let rate_line = if policy.enabled {
        format!(
            "• Rate limiting: {} requests per {}",
            policy.max_calls,
            format_period(policy.period)
        )
    } else {
        "• Rate limiting: disabled".to_string()
    };

    let html = format!(
        "🔍 <b>{BOT_NAME} - Help Guide</b>\n\n\
<b>What does this bot do?</b>\n\
This bot provides organized access to forex currency pairs \
categorized into Major, Minor, and Exotic pairs.\n\n\
<b>Command Reference:</b>\n\
• <code>/start</code> - Initialize bot and show main menu\n\
• <code>/pairs</code> - Display all pairs organized by category\n\
• <code>/major</code> - Show major currency pairs (most liquid)\n\
• <code>/minor</code> - Show minor currency pairs (cross pairs)\n\
• <code>/exotic</code> - Show exotic currency pairs (emerging markets)\n\
• <code>/random</code> - Get a random pair suggestion\n\
• <code>/stats</code> - View bot statistics\n\
• <code>/help</code> - Show this help message\n\n\
<b>Pair Categories Explained:</b>\n\
📌 <b>Major Pairs</b> - Most traded pairs involving USD\n\
📌 <b>Minor Pairs</b> - Cross currency pairs without USD\n\
📌 <b>Exotic Pairs</b> - Pairs with emerging market currencies\n\n\
<b>Security:</b>\n\
{rate_line}\n\
• All access attempts are logged\n\
• Optional user authorization available\n\n\
Need assistance? Contact the administrator."
    );
    Reply::text(html)
}

pub fn access_denied() -> Reply {
    Reply::text(ACCESS_DENIED)
}

pub fn rate_limited(retry_after: Option<Duration>) -> Reply {
    let hint = retry_after
        .map(|d| {
            let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
            format!(" Try again in {}s.", secs.max(1))
        })
        .unwrap_or_default();
    Reply::text(format!(
        "⏳ Rate limit exceeded. Please wait before trying again.{hint}"
    ))
}

pub fn category_not_found() -> Reply {
    Reply::text(CATEGORY_NOT_FOUND)
}

pub fn unknown_option() -> Reply {
    Reply::with_keyboard(UNKNOWN_OPTION, back_to_menu())
}

fn format_period(period: Duration) -> String {
    let secs = period.as_secs();
    match secs {
        60 => "minute".to_string(),
        3600 => "hour".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{s} seconds"),
    }
}
