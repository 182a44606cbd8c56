/// Fixed-point monetary values for the ledger
///
/// Amounts are stored as integer minor units with eight decimal places, the
/// same granularity as Bitcoin's satoshi. Balances may go negative (a pending
/// outgoing transfer, for instance), so the backing integer is signed.
///
/// ## Monetary Units
/// - **Unit**: the smallest representable amount (0.00000001 coins)
/// - **Coin**: 100,000,000 units
/// - **Supply limit**: 14,000,000 coins issued once in the genesis block
/// - **Miner reward**: 50 coins, halved every 10 appended blocks
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Number of minor units in one coin
pub const UNITS_PER_COIN: i64 = 100_000_000;

/// Decimal places carried by an [`Amount`]
pub const DECIMAL_PLACES: usize = 8;

/// Total supply minted by the genesis issuance (14 million coins)
pub const DEFAULT_SUPPLY_LIMIT: Amount = Amount::from_coins(14_000_000);

/// Reward paid to a miner for each appended block before any halving
pub const DEFAULT_MINER_REWARD: Amount = Amount::from_coins(50);

/// Amount transferred from the genesis wallet to each user wallet at start-up
pub const DEFAULT_GENESIS_TRANSFER: Amount = Amount::from_coins(50);

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_units(units: i64) -> Amount {
        Amount(units)
    }

    pub const fn from_coins(coins: i64) -> Amount {
        Amount(coins * UNITS_PER_COIN)
    }

    pub const fn units(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Half of this amount, truncated toward zero at the last decimal place.
    pub fn halved(self) -> Amount {
        Amount(self.0 / 2)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        *self = *self - rhs;
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(self.0.saturating_neg())
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let per_coin = UNITS_PER_COIN as u64;
        write!(
            f,
            "{sign}{}.{:0width$}",
            magnitude / per_coin,
            magnitude % per_coin,
            width = DECIMAL_PLACES
        )
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Amount> {
        let invalid = || LedgerError::Config(format!("Invalid amount: {s:?}"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > DECIMAL_PLACES
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().map_err(|_| invalid())?
        };
        let fraction_units = if fraction.is_empty() {
            0
        } else {
            format!("{fraction:0<width$}", width = DECIMAL_PLACES)
                .parse::<i64>()
                .map_err(|_| invalid())?
        };

        let units = whole_units
            .checked_mul(UNITS_PER_COIN)
            .and_then(|u| u.checked_add(fraction_units))
            .ok_or_else(invalid)?;
        Ok(Amount(if negative { -units } else { units }))
    }
}

impl TryFrom<String> for Amount {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Amount> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> String {
        amount.to_string()
    }
}
