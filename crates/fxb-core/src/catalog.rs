//! Static forex pair catalog.
//!
//! Categories are a closed set; symbols keep their insertion order so every
//! listing renders the same way for the same catalog.

use std::{collections::HashSet, fmt};

use rand::{seq::SliceRandom, Rng};

use crate::{errors::Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Major,
    Minor,
    Exotic,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Major, Category::Minor, Category::Exotic];

    /// Case-insensitive lookup (`"major"`, `"Major"`, `" MAJOR "` all resolve).
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    /// Lowercase key, also used as the navigation token for the category.
    pub fn key(self) -> &'static str {
        match self {
            Category::Major => "major",
            Category::Minor => "minor",
            Category::Exotic => "exotic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Major => "Major",
            Category::Minor => "Minor",
            Category::Exotic => "Exotic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug)]
struct Entry {
    category: Category,
    symbols: Vec<String>,
}

/// Read-only mapping of category -> ordered symbols.
#[derive(Clone, Debug)]
pub struct PairCatalog {
    entries: Vec<Entry>,
}

impl PairCatalog {
    /// Build a catalog, rejecting malformed or duplicated symbols and repeated categories.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Category, Vec<S>)>,
        S: Into<String>,
    {
        let mut seen_categories = HashSet::new();
        let mut seen_symbols = HashSet::new();
        let mut out = Vec::new();

        for (category, symbols) in entries {
            if !seen_categories.insert(category) {
                return Err(Error::Config(format!("duplicate category: {category}")));
            }

            let mut list = Vec::with_capacity(symbols.len());
            for sym in symbols {
                let sym: String = sym.into();
                if !is_valid_symbol(&sym) {
                    return Err(Error::Config(format!("malformed pair symbol: {sym:?}")));
                }
                if !seen_symbols.insert(sym.clone()) {
                    return Err(Error::Config(format!("duplicate pair symbol: {sym}")));
                }
                list.push(sym);
            }

            out.push(Entry {
                category,
                symbols: list,
            });
        }

        Ok(Self { entries: out })
    }

    /// The built-in reference catalog: 7 major, 8 minor, 8 exotic pairs.
    pub fn reference() -> Self {
        let entries = vec![
            Entry {
                category: Category::Major,
                symbols: owned(&[
                    "EUR/USD", "GBP/USD", "USD/JPY", "USD/CHF", "AUD/USD", "USD/CAD", "NZD/USD",
                ]),
            },
            Entry {
                category: Category::Minor,
                symbols: owned(&[
                    "EUR/GBP", "EUR/AUD", "EUR/CAD", "EUR/JPY", "GBP/JPY", "GBP/AUD", "AUD/JPY",
                    "AUD/NZD",
                ]),
            },
            Entry {
                category: Category::Exotic,
                symbols: owned(&[
                    "USD/TRY", "USD/ZAR", "USD/MXN", "USD/SGD", "EUR/TRY", "GBP/ZAR", "USD/THB",
                    "USD/HKD",
                ]),
            },
        ];
        Self { entries }
    }

    /// Categories in insertion order, each with its symbols.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &[String])> + '_ {
        self.entries
            .iter()
            .map(|e| (e.category, e.symbols.as_slice()))
    }

    /// Symbols for `category`; empty when the catalog has no such entry.
    pub fn symbols(&self, category: Category) -> &[String] {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.symbols.as_slice())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.symbols.len()).sum()
    }

    /// Owning category of `symbol` (first match in insertion order).
    pub fn category_of(&self, symbol: &str) -> Option<Category> {
        self.entries
            .iter()
            .find(|e| e.symbols.iter().any(|s| s == symbol))
            .map(|e| e.category)
    }

    /// Uniform pick over the union of all symbols.
    pub fn random_pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&str, Category)> {
        let all: Vec<&String> = self.entries.iter().flat_map(|e| e.symbols.iter()).collect();
        let picked: &String = *all.choose(rng)?;
        let category = self.category_of(picked)?;
        Some((picked.as_str(), category))
    }
}

impl Default for PairCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

fn owned(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

/// `BASE/QUOTE`, three ASCII uppercase letters on each side.
fn is_valid_symbol(s: &str) -> bool {
    let Some((base, quote)) = s.split_once('/') else {
        return false;
    };
    [base, quote]
        .iter()
        .all(|code| code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(Category::parse("major"), Some(Category::Major));
        assert_eq!(Category::parse("Major"), Some(Category::Major));
        assert_eq!(Category::parse("MAJOR"), Some(Category::Major));
        assert_eq!(Category::parse("  exotic "), Some(Category::Exotic));
        assert_eq!(Category::parse("unknown"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn reference_catalog_counts() {
        let c = PairCatalog::reference();
        assert_eq!(c.symbols(Category::Major).len(), 7);
        assert_eq!(c.symbols(Category::Minor).len(), 8);
        assert_eq!(c.symbols(Category::Exotic).len(), 8);
        assert_eq!(c.total(), 23);

        let order: Vec<Category> = c.categories().map(|(cat, _)| cat).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn reference_catalog_passes_validation() {
        let c = PairCatalog::reference();
        let rebuilt = PairCatalog::new(c.categories().map(|(cat, syms)| (cat, syms.to_vec())));
        assert!(rebuilt.is_ok());
    }

    #[test]
    fn new_rejects_duplicate_symbols_across_categories() {
        let err = PairCatalog::new(vec![
            (Category::Major, vec!["EUR/USD"]),
            (Category::Minor, vec!["EUR/USD"]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate pair symbol"));
    }

    #[test]
    fn new_rejects_malformed_symbols() {
        for bad in ["EURUSD", "eur/usd", "EU/USD", "EUR/USDT", "EUR/"] {
            assert!(
                PairCatalog::new(vec![(Category::Major, vec![bad])]).is_err(),
                "expected {bad} to be rejected"
            );
        }
    }

    #[test]
    fn new_rejects_repeated_category() {
        assert!(PairCatalog::new(vec![
            (Category::Major, vec!["EUR/USD"]),
            (Category::Major, vec!["GBP/USD"]),
        ])
        .is_err());
    }

    #[test]
    fn missing_category_has_no_symbols() {
        let c = PairCatalog::new(vec![(Category::Major, vec!["EUR/USD"])]).unwrap();
        assert!(c.symbols(Category::Exotic).is_empty());
        assert_eq!(c.total(), 1);
    }

    #[test]
    fn random_pick_reports_owning_category() {
        let c = PairCatalog::reference();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let (sym, cat) = c.random_pick(&mut rng).unwrap();
            assert!(c.symbols(cat).iter().any(|s| s == sym));
            let owners = c
                .categories()
                .filter(|(_, syms)| syms.iter().any(|s| s == sym))
                .count();
            assert_eq!(owners, 1);
        }
    }

    #[test]
    fn random_pick_on_empty_catalog_is_none() {
        let c = PairCatalog::new(Vec::<(Category, Vec<String>)>::new()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(c.random_pick(&mut rng).is_none());
    }
}
