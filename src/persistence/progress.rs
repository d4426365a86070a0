//! Persistent coins and shop upgrades
//!
//! The stored form is a [`ProgressRecord`] carrying a salted BLAKE3 checksum.
//! Loading validates bounds and the checksum before anything reaches the game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::PersistError;

/// Current record format version
pub const PROGRESS_VERSION: u32 = 1;
/// Level cap for the timed powers
pub const MAX_UPGRADE_LEVEL: u8 = 5;
/// Sanity bound for balances
pub const MAX_REASONABLE_COINS: u64 = 100_000;

const CHECKSUM_SALT: &str = "meteor-rush-shop-v1";
const POWER_COSTS: [u64; 5] = [25, 50, 100, 200, 400];

/// Everything the shop sells
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    SuperPower,
    Shield,
    SlowMotion,
    Laser,
    Nuke,
    Multiplier,
    /// Nearby coins start homing without being touched
    CoinMagnet,
    /// Banked coins count twice
    DoubleCoins,
    /// Runs start with SuperShot active
    StartBoost,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 9] = [
        UpgradeKind::SuperPower,
        UpgradeKind::Shield,
        UpgradeKind::SlowMotion,
        UpgradeKind::Laser,
        UpgradeKind::Nuke,
        UpgradeKind::Multiplier,
        UpgradeKind::CoinMagnet,
        UpgradeKind::DoubleCoins,
        UpgradeKind::StartBoost,
    ];

    /// Stable key used in the stored record
    pub fn key(&self) -> &'static str {
        match self {
            UpgradeKind::SuperPower => "superpower",
            UpgradeKind::Shield => "shield",
            UpgradeKind::SlowMotion => "slowmotion",
            UpgradeKind::Laser => "laser",
            UpgradeKind::Nuke => "nuke",
            UpgradeKind::Multiplier => "multiplier",
            UpgradeKind::CoinMagnet => "coinmagnet",
            UpgradeKind::DoubleCoins => "doublecoins",
            UpgradeKind::StartBoost => "startboost",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    /// One-off specials cap at level 1
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            UpgradeKind::CoinMagnet | UpgradeKind::DoubleCoins | UpgradeKind::StartBoost
        )
    }

    pub fn max_level(&self) -> u8 {
        if self.is_special() { 1 } else { MAX_UPGRADE_LEVEL }
    }

    /// Price of the level after `current`, None when maxed
    pub fn cost(&self, current: u8) -> Option<u64> {
        if current >= self.max_level() {
            return None;
        }
        match self {
            UpgradeKind::CoinMagnet => Some(500),
            UpgradeKind::DoubleCoins | UpgradeKind::StartBoost => Some(250),
            _ => POWER_COSTS.get(current as usize).copied(),
        }
    }
}

/// Why a purchase did not go through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseError {
    MaxLevel,
    InsufficientCoins { cost: u64, coins: u64 },
}

/// In-memory progress
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    pub coins: u64,
    pub coins_lifetime: u64,
    upgrades: BTreeMap<UpgradeKind, u8>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit coins. Balances saturate at the sanity bound so a saved
    /// record always validates.
    pub fn add_coins(&mut self, amount: u64) {
        self.coins = (self.coins + amount).min(MAX_REASONABLE_COINS);
        self.coins_lifetime = (self.coins_lifetime + amount).min(MAX_REASONABLE_COINS);
    }

    pub fn spend_coins(&mut self, amount: u64) -> bool {
        if self.coins >= amount {
            self.coins -= amount;
            true
        } else {
            false
        }
    }

    pub fn level(&self, kind: UpgradeKind) -> u8 {
        self.upgrades.get(&kind).copied().unwrap_or(0)
    }

    pub fn has(&self, kind: UpgradeKind) -> bool {
        self.level(kind) > 0
    }

    /// Raise an upgrade by one level without paying
    pub fn upgrade(&mut self, kind: UpgradeKind) -> bool {
        let current = self.level(kind);
        if current >= kind.max_level() {
            return false;
        }
        self.upgrades.insert(kind, current + 1);
        true
    }

    /// Buy the next level. Returns the new level.
    pub fn purchase(&mut self, kind: UpgradeKind) -> Result<u8, PurchaseError> {
        let current = self.level(kind);
        let cost = kind.cost(current).ok_or(PurchaseError::MaxLevel)?;
        if !self.spend_coins(cost) {
            return Err(PurchaseError::InsufficientCoins {
                cost,
                coins: self.coins,
            });
        }
        self.upgrades.insert(kind, current + 1);
        Ok(current + 1)
    }

    pub fn upgrades(&self) -> impl Iterator<Item = (UpgradeKind, u8)> + '_ {
        self.upgrades.iter().map(|(k, v)| (*k, *v))
    }

    /// Build the stored form with a fresh checksum
    pub fn to_record(&self) -> ProgressRecord {
        let mut record = ProgressRecord {
            coins: self.coins,
            coins_lifetime: self.coins_lifetime,
            upgrades: self
                .upgrades
                .iter()
                .filter(|(_, level)| **level > 0)
                .map(|(k, v)| (k.key().to_string(), u32::from(*v)))
                .collect(),
            version: PROGRESS_VERSION,
            checksum: String::new(),
        };
        record.checksum = record.compute_checksum();
        record
    }

    /// Validate a stored record and convert it
    pub fn from_record(record: &ProgressRecord) -> Result<Self, PersistError> {
        record.validate()?;
        let mut upgrades = BTreeMap::new();
        for (key, level) in &record.upgrades {
            let kind =
                UpgradeKind::from_key(key).ok_or_else(|| PersistError::UnknownUpgrade(key.clone()))?;
            // Bounds were checked above
            upgrades.insert(kind, *level as u8);
        }
        Ok(Self {
            coins: record.coins,
            coins_lifetime: record.coins_lifetime,
            upgrades,
        })
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string(&self.to_record()).map_err(|source| PersistError::Json {
            record: super::PROGRESS_RECORD,
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let record: ProgressRecord = serde_json::from_str(json).map_err(|source| PersistError::Json {
            record: super::PROGRESS_RECORD,
            source,
        })?;
        Self::from_record(&record)
    }
}

/// Stored progress record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub coins: u64,
    pub coins_lifetime: u64,
    #[serde(default)]
    pub upgrades: BTreeMap<String, u32>,
    pub version: u32,
    #[serde(default)]
    pub checksum: String,
}

impl ProgressRecord {
    /// Salted BLAKE3 over every field but the checksum, upgrades in key order
    pub fn compute_checksum(&self) -> String {
        let upgrades: Vec<String> = self.upgrades.iter().map(|(k, v)| format!("{k}:{v}")).collect();
        let payload = format!(
            "{}|{}|{}|{}|{}",
            self.coins,
            self.coins_lifetime,
            upgrades.join(","),
            self.version,
            CHECKSUM_SALT
        );
        blake3::hash(payload.as_bytes()).to_hex().to_string()
    }

    pub fn validate(&self) -> Result<(), PersistError> {
        if self.coins > MAX_REASONABLE_COINS {
            return Err(PersistError::OutOfBounds {
                field: "coins".to_string(),
                value: self.coins,
            });
        }
        if self.coins_lifetime < self.coins {
            return Err(PersistError::LifetimeBelowBalance {
                coins: self.coins,
                lifetime: self.coins_lifetime,
            });
        }
        if self.coins_lifetime > MAX_REASONABLE_COINS {
            return Err(PersistError::OutOfBounds {
                field: "lifetime coins".to_string(),
                value: self.coins_lifetime,
            });
        }
        for (key, level) in &self.upgrades {
            let kind =
                UpgradeKind::from_key(key).ok_or_else(|| PersistError::UnknownUpgrade(key.clone()))?;
            if *level > u32::from(kind.max_level()) {
                return Err(PersistError::OutOfBounds {
                    field: format!("upgrade level for {key}"),
                    value: u64::from(*level),
                });
            }
        }
        if self.checksum != self.compute_checksum() {
            return Err(PersistError::ChecksumMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_costs_follow_catalogue() {
        let costs: Vec<u64> = (0..5).filter_map(|l| UpgradeKind::Shield.cost(l)).collect();
        assert_eq!(costs, vec![25, 50, 100, 200, 400]);
        assert_eq!(UpgradeKind::Shield.cost(5), None);
        assert_eq!(UpgradeKind::CoinMagnet.cost(0), Some(500));
        assert_eq!(UpgradeKind::DoubleCoins.cost(1), None);
        assert_eq!(UpgradeKind::from_key("startboost"), Some(UpgradeKind::StartBoost));
        assert_eq!(UpgradeKind::from_key("warp"), None);
    }

    #[test]
    fn test_purchase_spends_and_caps() {
        let mut progress = Progress::new();
        progress.add_coins(30);
        assert_eq!(progress.purchase(UpgradeKind::Laser), Ok(1));
        assert_eq!(progress.coins, 5);
        assert_eq!(progress.coins_lifetime, 30);
        assert_eq!(
            progress.purchase(UpgradeKind::Laser),
            Err(PurchaseError::InsufficientCoins { cost: 50, coins: 5 })
        );

        progress.add_coins(1000);
        assert_eq!(progress.purchase(UpgradeKind::StartBoost), Ok(1));
        assert_eq!(progress.purchase(UpgradeKind::StartBoost), Err(PurchaseError::MaxLevel));
    }

    #[test]
    fn test_tampered_record_is_rejected() {
        let mut progress = Progress::new();
        progress.add_coins(100);
        let mut record = progress.to_record();
        record.coins = 99;
        assert!(matches!(
            Progress::from_record(&record),
            Err(PersistError::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_out_of_bounds_records_are_rejected() {
        let mut record = Progress::new().to_record();
        record.upgrades.insert("shield".into(), 6);
        record.checksum = record.compute_checksum();
        assert!(matches!(
            Progress::from_record(&record),
            Err(PersistError::OutOfBounds { .. })
        ));

        let mut record = Progress::new().to_record();
        record.upgrades.insert("hyperdrive".into(), 1);
        record.checksum = record.compute_checksum();
        assert!(matches!(
            Progress::from_record(&record),
            Err(PersistError::UnknownUpgrade(_))
        ));

        let mut record = Progress::new().to_record();
        record.coins = 10;
        record.coins_lifetime = 5;
        record.checksum = record.compute_checksum();
        assert!(matches!(
            Progress::from_record(&record),
            Err(PersistError::LifetimeBelowBalance { .. })
        ));

        let mut record = Progress::new().to_record();
        record.coins = MAX_REASONABLE_COINS + 1;
        record.coins_lifetime = MAX_REASONABLE_COINS + 1;
        record.checksum = record.compute_checksum();
        assert!(matches!(
            Progress::from_record(&record),
            Err(PersistError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_coins_saturate_at_bound() {
        let mut progress = Progress::new();
        progress.add_coins(MAX_REASONABLE_COINS + 500);
        assert_eq!(progress.coins, MAX_REASONABLE_COINS);
        assert!(progress.to_record().validate().is_ok());
    }

    #[test]
    fn test_json_uses_camel_case() {
        let json = Progress::new().to_json().unwrap();
        assert!(json.contains("coinsLifetime"));
        assert!(json.contains("checksum"));
    }

    proptest! {
        #[test]
        fn record_round_trip_preserves_progress(
            coins in 0u64..50_000,
            extra in 0u64..50_000,
            levels in proptest::collection::vec(0u8..=5, 9),
        ) {
            let mut progress = Progress::new();
            progress.add_coins(coins + extra);
            prop_assert!(progress.spend_coins(extra));
            for (kind, level) in UpgradeKind::ALL.into_iter().zip(levels) {
                for _ in 0..level {
                    progress.upgrade(kind);
                }
            }

            let record = progress.to_record();
            prop_assert_eq!(record.checksum.clone(), record.compute_checksum());
            let restored = Progress::from_record(&record).unwrap();
            prop_assert_eq!(restored, progress);
        }
    }
}
