// VRF Lottery Program
// A time-gated lottery that draws its winner from an oracle's random words

pub mod error;
pub mod events;
pub mod instruction;
pub mod mock_coordinator;
pub mod network_config;
pub mod processor;
pub mod state;
pub mod utils;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

solana_program::declare_id!("7tUzJmcNMhNmdoZ5P4x4ZXqYfmQGVFmkn9WxDSLWrtTR");

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
