//! Order destinations and the preferred-destination lookup used when
//! flattening positions.

use crate::definitions::MarketCode;
use serde::{Deserialize, Serialize};

/// A destination identifier, naming the venue or gateway an order is
/// routed to.
pub type Destination = String;

/// Destination identifiers for the venues the fee pipeline covers.
pub mod destinations {
    /// NYSE American.
    pub const AMEX: &str = "AMEX";
    /// NYSE Arca.
    pub const ARCA: &str = "ARCA";
    /// BATS Exchange.
    pub const BATS: &str = "BATS";
    /// BATS Y-Exchange.
    pub const BATY: &str = "BATY";
    /// EDGA Exchange.
    pub const EDGA: &str = "EDGA";
    /// EDGX Exchange.
    pub const EDGX: &str = "EDGX";
    /// NASDAQ.
    pub const NASDAQ: &str = "NASDAQ";
    /// NYSE.
    pub const NYSE: &str = "NYSE";
    /// Aequitas NEO Exchange.
    pub const NEOE: &str = "NEOE";
    /// Pure Trading (Canadian ATS).
    pub const PURE: &str = "PURE";
    /// Toronto Stock Exchange.
    pub const TSX: &str = "TSX";
    /// ASX TradeMatch.
    pub const ASXT: &str = "ASXT";
    /// Manual order entry.
    pub const MOE: &str = "MOE";
}

/// One destination known to the [`DestinationDatabase`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationEntry {
    /// The destination identifier.
    pub id: Destination,
    /// A human readable description.
    pub description: String,
    /// The markets this destination accepts orders for.
    pub markets: Vec<MarketCode>,
}

/// The lookup table of destinations.
///
/// The risk controller uses [`DestinationDatabase::preferred_destination`]
/// to route flattening orders; everything else treats destinations as
/// opaque identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationDatabase {
    entries: Vec<DestinationEntry>,
    preferred: Vec<(MarketCode, Destination)>,
}

impl DestinationDatabase {
    /// An empty database.
    pub fn new() -> Self {
        DestinationDatabase::default()
    }

    /// Adds an entry.
    pub fn add(&mut self, entry: DestinationEntry) {
        self.entries.push(entry);
    }

    /// Sets the preferred destination for a market.
    pub fn set_preferred_destination(&mut self, market: MarketCode, destination: Destination) {
        if let Some(slot) = self.preferred.iter_mut().find(|(code, _)| *code == market) {
            slot.1 = destination;
        } else {
            self.preferred.push((market, destination));
        }
    }

    /// The preferred destination for orders on `market`, if one is set.
    pub fn preferred_destination(&self, market: MarketCode) -> Option<&Destination> {
        self.preferred
            .iter()
            .find(|(code, _)| *code == market)
            .map(|(_, destination)| destination)
    }

    /// Looks up an entry by its identifier.
    pub fn from_id(&self, id: &str) -> Option<&DestinationEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// The destinations this platform routes to, with market preferences
    /// pointing at each listing market's primary venue.
    pub fn venues() -> DestinationDatabase {
        let mut database = DestinationDatabase::new();
        let mut add = |id: &str, description: &str, markets: &[MarketCode]| {
            database.add(DestinationEntry {
                id: id.to_string(),
                description: description.to_string(),
                markets: markets.to_vec(),
            });
        };
        let us_equities = [MarketCode::XASE, MarketCode::XNYS, MarketCode::XNAS];
        let ca_equities = [MarketCode::XTSE, MarketCode::XTSX];
        add(destinations::AMEX, "NYSE American", &[MarketCode::XASE]);
        add(destinations::ARCA, "NYSE Arca", &us_equities);
        add(destinations::BATS, "BATS Exchange", &us_equities);
        add(destinations::BATY, "BATS Y-Exchange", &us_equities);
        add(destinations::EDGA, "EDGA Exchange", &us_equities);
        add(destinations::EDGX, "EDGX Exchange", &us_equities);
        add(
            destinations::NYSE,
            "NYSE",
            &[MarketCode::XASE, MarketCode::XNYS],
        );
        add(destinations::NASDAQ, "NASDAQ", &us_equities);
        add(destinations::NEOE, "Aequitas NEO Exchange", &ca_equities);
        add(destinations::PURE, "Pure Trading", &ca_equities);
        add(destinations::TSX, "Toronto Stock Exchange", &ca_equities);
        add(destinations::ASXT, "ASX TradeMatch", &[MarketCode::XASX]);
        database.set_preferred_destination(MarketCode::XNYS, destinations::NYSE.to_string());
        database.set_preferred_destination(MarketCode::XASE, destinations::AMEX.to_string());
        database.set_preferred_destination(MarketCode::XNAS, destinations::NASDAQ.to_string());
        database.set_preferred_destination(MarketCode::XTSE, destinations::TSX.to_string());
        database.set_preferred_destination(MarketCode::XTSX, destinations::TSX.to_string());
        database.set_preferred_destination(MarketCode::NEOE, destinations::NEOE.to_string());
        database.set_preferred_destination(MarketCode::XASX, destinations::ASXT.to_string());
        database
    }
}
