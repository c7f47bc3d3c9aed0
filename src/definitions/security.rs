//! Securities and the market lookup contract they are parsed against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A four-character market identification code (MIC style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarketCode([u8; 4]);

impl MarketCode {
    /// Toronto Stock Exchange.
    pub const XTSE: MarketCode = MarketCode(*b"XTSE");
    /// TSX Venture Exchange.
    pub const XTSX: MarketCode = MarketCode(*b"XTSX");
    /// New York Stock Exchange.
    pub const XNYS: MarketCode = MarketCode(*b"XNYS");
    /// NASDAQ.
    pub const XNAS: MarketCode = MarketCode(*b"XNAS");
    /// NYSE American (AMEX).
    pub const XASE: MarketCode = MarketCode(*b"XASE");
    /// NYSE Arca.
    pub const ARCX: MarketCode = MarketCode(*b"ARCX");
    /// BATS Exchange.
    pub const BATS: MarketCode = MarketCode(*b"BATS");
    /// BATS Y-Exchange.
    pub const BATY: MarketCode = MarketCode(*b"BATY");
    /// EDGA Exchange.
    pub const EDGA: MarketCode = MarketCode(*b"EDGA");
    /// EDGX Exchange.
    pub const EDGX: MarketCode = MarketCode(*b"EDGX");
    /// NEO Exchange.
    pub const NEOE: MarketCode = MarketCode(*b"NEOE");
    /// Australian Securities Exchange.
    pub const XASX: MarketCode = MarketCode(*b"XASX");

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default().trim_end()
    }
}

impl fmt::Display for MarketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MarketCode {
    type Err = ParseSecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return Err(ParseSecurityError::InvalidMarket(s.to_string()));
        }
        let mut code = *b"    ";
        code[..bytes.len()].copy_from_slice(bytes);
        Ok(MarketCode(code))
    }
}

impl Serialize for MarketCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MarketCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// An ISO 3166 alpha-2 country code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// United States.
    pub const US: CountryCode = CountryCode(*b"US");
    /// Canada.
    pub const CA: CountryCode = CountryCode(*b"CA");
    /// Australia.
    pub const AU: CountryCode = CountryCode(*b"AU");

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CountryCode {
    type Err = ParseSecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ParseSecurityError::InvalidCountry(s.to_string()));
        }
        Ok(CountryCode([bytes[0], bytes[1]]))
    }
}

impl Serialize for CountryCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// One market known to the [`MarketDatabase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEntry {
    /// The market's identification code.
    pub code: MarketCode,
    /// The country the market operates in.
    pub country: CountryCode,
    /// The short name used when displaying and parsing securities.
    pub display_name: String,
    /// A human readable description.
    pub description: String,
}

/// The lookup table of markets, consulted when parsing and displaying
/// securities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketDatabase {
    entries: Vec<MarketEntry>,
}

impl MarketDatabase {
    /// An empty database.
    pub fn new() -> Self {
        MarketDatabase::default()
    }

    /// Adds an entry.
    pub fn add(&mut self, entry: MarketEntry) {
        self.entries.push(entry);
    }

    /// Looks up an entry by its code.
    pub fn from_code(&self, code: MarketCode) -> Option<&MarketEntry> {
        self.entries.iter().find(|entry| entry.code == code)
    }

    /// Looks up an entry by its display name.
    pub fn from_display_name(&self, name: &str) -> Option<&MarketEntry> {
        self.entries.iter().find(|entry| entry.display_name == name)
    }

    /// All entries.
    pub fn entries(&self) -> &[MarketEntry] {
        &self.entries
    }

    /// The markets this platform trades on.
    pub fn venues() -> MarketDatabase {
        let mut database = MarketDatabase::new();
        let mut add = |code, country, display_name: &str, description: &str| {
            database.add(MarketEntry {
                code,
                country,
                display_name: display_name.to_string(),
                description: description.to_string(),
            });
        };
        add(MarketCode::XASE, CountryCode::US, "AMEX", "NYSE American");
        add(MarketCode::ARCX, CountryCode::US, "ARCA", "NYSE Arca");
        add(MarketCode::BATS, CountryCode::US, "BATS", "BATS Exchange");
        add(MarketCode::BATY, CountryCode::US, "BATY", "BATS Y-Exchange");
        add(MarketCode::EDGA, CountryCode::US, "EDGA", "EDGA Exchange");
        add(MarketCode::EDGX, CountryCode::US, "EDGX", "EDGX Exchange");
        add(MarketCode::XNAS, CountryCode::US, "NASDAQ", "NASDAQ");
        add(MarketCode::XNYS, CountryCode::US, "NYSE", "New York Stock Exchange");
        add(
            MarketCode::NEOE,
            CountryCode::CA,
            "NEOE",
            "Aequitas NEO Exchange",
        );
        add(
            MarketCode::XTSE,
            CountryCode::CA,
            "TSX",
            "Toronto Stock Exchange",
        );
        add(
            MarketCode::XTSX,
            CountryCode::CA,
            "TSXV",
            "TSX Venture Exchange",
        );
        add(
            MarketCode::XASX,
            CountryCode::AU,
            "ASX",
            "Australian Securities Exchange",
        );
        database
    }
}

/// Error parsing a security from its display text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSecurityError {
    /// The text is not of the form `SYMBOL.MARKET.COUNTRY`.
    #[error("malformed security: {0}")]
    Malformed(String),

    /// The market segment is not a known code or display name.
    #[error("unknown market: {0}")]
    InvalidMarket(String),

    /// The country segment is not a two letter code.
    #[error("invalid country: {0}")]
    InvalidCountry(String),
}

/// Identifies a tradeable instrument: a symbol listed on a market in a
/// country.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Security {
    /// The ticker symbol.
    pub symbol: String,
    /// The listing market.
    pub market: MarketCode,
    /// The listing country.
    pub country: CountryCode,
}

impl Security {
    /// Builds a security.
    pub fn new(symbol: impl Into<String>, market: MarketCode, country: CountryCode) -> Self {
        Security {
            symbol: symbol.into(),
            market,
            country,
        }
    }

    /// Parses a security from `SYMBOL.MARKET.COUNTRY` text, where `MARKET`
    /// is either a display name or a market code known to `database`.
    pub fn parse(text: &str, database: &MarketDatabase) -> Result<Security, ParseSecurityError> {
        let mut segments = text.rsplitn(3, '.');
        let country = segments
            .next()
            .ok_or_else(|| ParseSecurityError::Malformed(text.to_string()))?;
        let market = segments
            .next()
            .ok_or_else(|| ParseSecurityError::Malformed(text.to_string()))?;
        let symbol = segments
            .next()
            .ok_or_else(|| ParseSecurityError::Malformed(text.to_string()))?;
        if symbol.is_empty() {
            return Err(ParseSecurityError::Malformed(text.to_string()));
        }
        let country = country.parse::<CountryCode>()?;
        let entry = database
            .from_display_name(market)
            .or_else(|| market.parse().ok().and_then(|code| database.from_code(code)))
            .ok_or_else(|| ParseSecurityError::InvalidMarket(market.to_string()))?;
        Ok(Security::new(symbol, entry.code, country))
    }

    /// Formats the security as `SYMBOL.MARKET.COUNTRY` using the market's
    /// display name when the database knows it.
    pub fn display(&self, database: &MarketDatabase) -> String {
        let market = database
            .from_code(self.market)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| self.market.to_string());
        format!("{}.{}.{}", self.symbol, market, self.country)
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.symbol, self.market, self.country)
    }
}
