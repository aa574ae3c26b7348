//! Menu navigation tokens.
//!
//! The token carried by a button press fully determines the next view; no
//! "current menu" is kept between events.

use crate::catalog::Category;

pub const BACK_TO_MENU: &str = "back_to_menu";
pub const ALL: &str = "all";
pub const RANDOM: &str = "random";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavToken {
    Category(Category),
    All,
    Random,
    BackToMenu,
}

impl NavToken {
    /// Exact match on the callback data; anything else is an unknown option.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            ALL => Some(NavToken::All),
            RANDOM => Some(NavToken::Random),
            BACK_TO_MENU => Some(NavToken::BackToMenu),
            other => Category::ALL
                .into_iter()
                .find(|c| c.key() == other)
                .map(NavToken::Category),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NavToken::Category(c) => c.key(),
            NavToken::All => ALL,
            NavToken::Random => RANDOM,
            NavToken::BackToMenu => BACK_TO_MENU,
        }
    }
}
