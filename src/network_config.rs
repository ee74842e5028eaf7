// VRF Lottery Program - Network Configuration
use std::str::FromStr;

use solana_program::{pubkey::Pubkey, rent::Rent};
use thiserror::Error;

use crate::{mock_coordinator, state::LotteryConfig, utils::sol_to_lamports};

/// Callback compute budget used on every network
pub const DEFAULT_CALLBACK_COMPUTE_LIMIT: u32 = 500_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Lottery config has no oracle program")]
    MissingOracle,

    #[error("Entry fee {fee} is below the rent-exempt minimum {minimum}")]
    EntryFeeBelowRent { fee: u64, minimum: u64 },
}

/// Cluster a lottery is deployed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Devnet,
    MainnetBeta,
    Localnet,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Environment::Devnet),
            "mainnet-beta" | "mainnet" => Ok(Environment::MainnetBeta),
            "localnet" | "local" | "test" => Ok(Environment::Localnet),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

impl Environment {
    pub fn config(&self) -> LotteryConfig {
        match self {
            Environment::Devnet => {
                // Devnet coordinator: Btf6LjqRh7ohc1xQAwpZDo9xiC8kVJXo9YS39VKPprBT
                let coordinator_bytes = [
                    161, 208, 143, 182, 23, 219, 106, 170, 197, 246, 143, 108, 135, 116, 128, 49,
                    116, 112, 47, 117, 73, 223, 220, 107, 27, 231, 141, 149, 210, 38, 195, 58,
                ];
                let key_hash = [
                    0x47, 0x4e, 0x34, 0xa0, 0x77, 0xdf, 0x58, 0x80, 0x7d, 0xbe, 0x9c, 0x96, 0xd3,
                    0xc0, 0x09, 0xb2, 0x3b, 0x3c, 0x6d, 0x0c, 0xce, 0x43, 0x3e, 0x59, 0xbb, 0xf5,
                    0xb3, 0x4f, 0x82, 0x3b, 0xc5, 0x6c,
                ];
                LotteryConfig {
                    entry_fee: sol_to_lamports(0.01),
                    draw_interval: 30,
                    oracle_program: Pubkey::new_from_array(coordinator_bytes),
                    key_hash,
                    subscription_id: 588,
                    callback_compute_limit: DEFAULT_CALLBACK_COMPUTE_LIMIT,
                }
            }
            Environment::MainnetBeta => {
                // Mainnet coordinator: 9FJ5DpJMfocvXeZrCLHx4E5JU9rXjDdqk3etpKfXvsHN
                let coordinator_bytes = [
                    122, 134, 238, 85, 29, 65, 192, 141, 48, 31, 230, 40, 184, 62, 21, 28, 60, 57,
                    140, 160, 34, 29, 189, 15, 165, 119, 84, 140, 130, 212, 207, 165,
                ];
                let key_hash = [
                    0x8a, 0xf3, 0x98, 0x99, 0x5b, 0x04, 0xc2, 0x8e, 0x9a, 0x51, 0xad, 0xb9, 0x72,
                    0x1e, 0xf7, 0x4c, 0x74, 0xf9, 0x3e, 0x6a, 0x47, 0x8f, 0x39, 0xe7, 0xe0, 0x77,
                    0x7b, 0xe1, 0x3e, 0xa5, 0xda, 0xea,
                ];
                LotteryConfig {
                    entry_fee: sol_to_lamports(0.1),
                    draw_interval: 24 * 60 * 60,
                    oracle_program: Pubkey::new_from_array(coordinator_bytes),
                    key_hash,
                    subscription_id: 1,
                    callback_compute_limit: DEFAULT_CALLBACK_COMPUTE_LIMIT,
                }
            }
            Environment::Localnet => LotteryConfig {
                entry_fee: sol_to_lamports(0.01),
                draw_interval: 30,
                oracle_program: mock_coordinator::id(),
                key_hash: [0u8; 32],
                subscription_id: 1,
                callback_compute_limit: DEFAULT_CALLBACK_COMPUTE_LIMIT,
            },
        }
    }
}

/// Look up the lottery config for an environment identifier
pub fn config_for(id: &str) -> Result<LotteryConfig, ConfigError> {
    Ok(id.parse::<Environment>()?.config())
}

impl LotteryConfig {
    /// Checks a config before it is written to a lottery account.
    ///
    /// The entry fee must cover the rent-exempt minimum of an empty account,
    /// so any prize leaves an emptied winner wallet rent-exempt.
    pub fn validate(&self, rent: &Rent) -> Result<(), ConfigError> {
        if self.oracle_program == Pubkey::default() {
            return Err(ConfigError::MissingOracle);
        }
        let minimum = rent.minimum_balance(0);
        if self.entry_fee < minimum {
            return Err(ConfigError::EntryFeeBelowRent {
                fee: self.entry_fee,
                minimum,
            });
        }
        Ok(())
    }
}
