use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tradable instrument as listed in the broker's directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    /// Ticker code on the board (e.g. "SBER")
    pub code: String,
    /// Trading venue code (e.g. "TQBR")
    pub board: String,
    /// Market the board belongs to (e.g. "Stock", "Futures")
    #[serde(default)]
    pub market: String,
    /// Number of decimal places in prices
    #[serde(default)]
    pub decimals: u32,
    /// Number of units in one lot
    #[serde(default = "default_lot_size")]
    pub lot_size: i64,
    /// Minimal price step in units of `10^-decimals`
    #[serde(default)]
    pub min_step: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

fn default_lot_size() -> i64 {
    1
}

impl Security {
    /// Create a security with the given board and code and neutral trading parameters.
    pub fn new(board: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            board: board.into(),
            market: String::new(),
            decimals: 0,
            lot_size: default_lot_size(),
            min_step: 0,
            currency: None,
            short_name: None,
        }
    }

    /// Minimal price step as a decimal price.
    ///
    /// Returns zero when `decimals` exceeds the supported decimal scale.
    pub fn price_step(&self) -> Decimal {
        Decimal::try_new(self.min_step, self.decimals).unwrap_or(Decimal::ZERO)
    }
}

/// Snapshot of every tradable instrument known to a broker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDirectory {
    pub securities: Vec<Security>,
}

impl SecurityDirectory {
    pub fn new(securities: Vec<Security>) -> Self {
        Self { securities }
    }

    /// First security listed on `board` with ticker `code`.
    pub fn find(&self, board: &str, code: &str) -> Option<&Security> {
        self.securities
            .iter()
            .find(|security| security.board == board && security.code == code)
    }

    /// Board of the first security with ticker `code`.
    pub fn first_board_for(&self, code: &str) -> Option<&str> {
        self.securities
            .iter()
            .find(|security| security.code == code)
            .map(|security| security.board.as_str())
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Security> {
        self.securities.iter()
    }
}
