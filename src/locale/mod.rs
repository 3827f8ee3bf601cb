// invoice-design-service/src/locale/mod.rs

//! Translation and formatting tables.
//!
//! The catalog is built once at startup and only read afterwards, so it is
//! shared between renders behind an `Arc` without any locking. A requested
//! locale resolves through a chain: exact code, then its language, then the
//! catalog's fallback locale.

mod format;

pub use format::{
    currency, format_amount, format_date, format_money, format_quantity, Currency, Money,
};

use crate::error::{DocumentError, Result};
use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Separators and currency symbol placement for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NumberFormat {
    pub thousand_separator: String,
    pub decimal_separator: String,
    /// `1.204,50 €` rather than `€1.204,50`.
    #[serde(default)]
    pub symbol_after: bool,
    /// Put a space between the amount and the symbol.
    #[serde(default)]
    pub symbol_space: bool,
}

/// Contents of one `<code>.json` locale file. Everything is optional so a
/// regional file only needs to carry what differs from its language.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocaleData {
    #[serde(default)]
    pub number_format: Option<NumberFormat>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
}

impl LocaleData {
    fn merge(&mut self, other: LocaleData) {
        if other.number_format.is_some() {
            self.number_format = other.number_format;
        }
        if other.date_format.is_some() {
            self.date_format = other.date_format;
        }
        self.texts.extend(other.texts);
    }
}

const EMBEDDED: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("en_GB", include_str!("../../locales/en_GB.json")),
    ("de", include_str!("../../locales/de.json")),
    ("fr", include_str!("../../locales/fr.json")),
    ("es", include_str!("../../locales/es.json")),
];

/// Normalize `en-gb`, `en_GB`, `EN_gb` to `en_GB`.
pub fn normalize_code(code: &str) -> String {
    let code = code.trim().replace('-', "_");
    match code.split_once('_') {
        Some((language, region)) => {
            format!("{}_{}", language.to_ascii_lowercase(), region.to_ascii_uppercase())
        }
        None => code.to_ascii_lowercase(),
    }
}

#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    fallback: String,
    locales: BTreeMap<String, LocaleData>,
}

impl LocaleCatalog {
    /// Catalog built from the locale files compiled into the binary.
    pub fn embedded(fallback: &str) -> Result<Self> {
        let mut catalog = Self {
            fallback: normalize_code(fallback),
            locales: BTreeMap::new(),
        };
        for (code, raw) in EMBEDDED {
            let data: LocaleData = serde_json::from_str(raw)
                .map_err(|e| DocumentError::LocaleData(format!("{}: {}", code, e)))?;
            catalog.insert(code, data)?;
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Merge every `<code>.json` in `dir` over the current tables.
    pub fn load_overrides(&mut self, dir: &Path) -> Result<()> {
        let mut loaded = 0usize;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = std::fs::read_to_string(&path)?;
            let data: LocaleData = serde_json::from_str(&raw).map_err(|e| {
                DocumentError::LocaleData(format!("{}: {}", path.display(), e))
            })?;
            debug!(locale = %code, path = %path.display(), "Loaded locale override");
            self.insert(code, data)?;
            loaded += 1;
        }
        self.validate()?;
        info!(dir = %dir.display(), files = loaded, "Locale overrides loaded");
        Ok(())
    }

    /// Add or merge the tables for `code`.
    pub fn insert(&mut self, code: &str, data: LocaleData) -> Result<()> {
        if let Some(fmt) = &data.date_format {
            check_date_format(code, fmt)?;
        }
        self.locales
            .entry(normalize_code(code))
            .or_default()
            .merge(data);
        Ok(())
    }

    /// The fallback locale has to be able to answer every formatting query.
    fn validate(&self) -> Result<()> {
        let base = self.locales.get(&self.fallback).ok_or_else(|| {
            DocumentError::LocaleData(format!("fallback locale `{}` is not loaded", self.fallback))
        })?;
        if base.number_format.is_none() || base.date_format.is_none() {
            return Err(DocumentError::LocaleData(format!(
                "fallback locale `{}` needs a number_format and a date_format",
                self.fallback
            )));
        }
        Ok(())
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn contains(&self, code: &str) -> bool {
        self.locales.contains_key(&normalize_code(code))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(String::as_str)
    }

    /// Resolve `requested` (or the fallback when `None`) to a lookup chain.
    pub fn locale(&self, requested: Option<&str>) -> Locale<'_> {
        let code = requested
            .map(normalize_code)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.fallback.clone());

        let language = code.split('_').next().unwrap_or_default().to_string();
        let known = self.locales.contains_key(&code) || self.locales.contains_key(&language);

        let mut chain: Vec<&LocaleData> = Vec::new();
        for candidate in [code.as_str(), language.as_str(), self.fallback.as_str()] {
            if let Some(data) = self.locales.get(candidate) {
                if !chain.iter().any(|d| std::ptr::eq(*d, data)) {
                    chain.push(data);
                }
            }
        }

        Locale { code, known, chain }
    }
}

fn check_date_format(code: &str, fmt: &str) -> Result<()> {
    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(DocumentError::LocaleData(format!(
            "{}: invalid date format `{}`",
            code, fmt
        )));
    }
    Ok(())
}

/// A resolved locale: the requested code plus the tables to consult, most
/// specific first. The last entry is always the fallback locale.
#[derive(Debug, Clone)]
pub struct Locale<'a> {
    code: String,
    known: bool,
    chain: Vec<&'a LocaleData>,
}

impl<'a> Locale<'a> {
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether the requested code (or its language) exists in the catalog.
    pub fn is_known(&self) -> bool {
        self.known
    }

    pub fn translate(&self, key: &str) -> Option<&'a str> {
        self.chain
            .iter()
            .copied()
            .find_map(|data| data.texts.get(key))
            .map(String::as_str)
    }

    pub fn number_format(&self) -> &'a NumberFormat {
        self.chain
            .iter()
            .copied()
            .find_map(|data| data.number_format.as_ref())
            .unwrap_or(&FALLBACK_NUMBER_FORMAT)
    }

    pub fn date_format(&self) -> &'a str {
        self.chain
            .iter()
            .copied()
            .find_map(|data| data.date_format.as_deref())
            .unwrap_or("%Y-%m-%d")
    }
}

// Only reachable for a catalog whose fallback failed validation.
static FALLBACK_NUMBER_FORMAT: NumberFormat = NumberFormat {
    thousand_separator: String::new(),
    decimal_separator: String::new(),
    symbol_after: false,
    symbol_space: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LocaleCatalog {
        LocaleCatalog::embedded("en").unwrap()
    }

    #[test]
    fn normalizes_codes() {
        assert_eq!(normalize_code("en-gb"), "en_GB");
        assert_eq!(normalize_code(" DE "), "de");
    }

    #[test]
    fn exact_locale_wins() {
        let catalog = catalog();
        let de = catalog.locale(Some("de"));
        assert!(de.is_known());
        assert_eq!(de.translate("balance_due"), Some("Offener Betrag"));
        assert_eq!(de.number_format().decimal_separator, ",");
    }

    #[test]
    fn regional_locale_falls_back_to_language() {
        let catalog = catalog();
        let gb = catalog.locale(Some("en-GB"));
        assert_eq!(gb.code(), "en_GB");
        assert_eq!(gb.translate("po_number"), Some("Purchase Order"));
        assert_eq!(gb.translate("balance_due"), Some("Balance Due"));
        assert_eq!(gb.date_format(), "%-d %b %Y");
        assert_eq!(gb.number_format().thousand_separator, ",");
    }

    #[test]
    fn unknown_region_uses_language_tables() {
        let catalog = catalog();
        let ch = catalog.locale(Some("de_CH"));
        assert!(ch.is_known());
        assert_eq!(ch.translate("total"), Some("Gesamtbetrag"));
    }

    #[test]
    fn missing_translation_falls_back_to_base_locale() {
        let catalog = catalog();
        let es = catalog.locale(Some("es"));
        assert_eq!(es.translate("vat_number"), Some("VAT Number"));
        assert_eq!(es.translate("no_such_key"), None);
    }

    #[test]
    fn unknown_locale_uses_fallback() {
        let catalog = catalog();
        let xx = catalog.locale(Some("xx"));
        assert!(!xx.is_known());
        assert_eq!(xx.translate("total"), Some("Total"));
    }

    #[test]
    fn rejects_invalid_date_format() {
        let mut catalog = catalog();
        let data = LocaleData {
            date_format: Some("%Q".to_string()),
            ..LocaleData::default()
        };
        assert!(catalog.insert("it", data).is_err());
    }

    #[test]
    fn missing_fallback_is_an_error() {
        assert!(LocaleCatalog::embedded("zz").is_err());
    }
}
