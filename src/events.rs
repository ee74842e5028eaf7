// VRF Lottery Program - Events
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, program_error::ProgramError, pubkey::Pubkey};

/// Events written to the transaction log for off-chain observers
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum LotteryEvent {
    /// A player entered the current round
    Entered { player: Pubkey, amount: u64 },
    /// A randomness request is in flight
    DrawRequested { request_id: u64 },
    /// The round was resolved and the prize paid
    WinnerPicked { winner: Pubkey, prize: u64 },
}

impl LotteryEvent {
    pub fn encode(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec().map_err(|_| ProgramError::InvalidArgument)
    }

    /// Parse the payload of a `Program data:` log line
    pub fn decode(data: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(data).map_err(|_| ProgramError::InvalidArgument)
    }

    /// Log the event, readable and as structured data
    pub fn emit(&self) -> Result<(), ProgramError> {
        match self {
            LotteryEvent::Entered { player, amount } => {
                msg!("Entered: player={} amount={}", player, amount)
            }
            LotteryEvent::DrawRequested { request_id } => {
                msg!("DrawRequested: request_id={}", request_id)
            }
            LotteryEvent::WinnerPicked { winner, prize } => {
                msg!("WinnerPicked: winner={} prize={}", winner, prize)
            }
        }
        sol_log_data(&[&self.encode()?]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_discriminants() {
        let player = Pubkey::new_unique();
        let entered = LotteryEvent::Entered { player, amount: 5 }.encode().unwrap();
        assert_eq!(entered[0], 0);
        assert_eq!(&entered[1..33], player.as_ref());
        assert_eq!(&entered[33..], &5u64.to_le_bytes());

        let requested = LotteryEvent::DrawRequested { request_id: 1 }.encode().unwrap();
        assert_eq!(requested[0], 1);

        let picked = LotteryEvent::WinnerPicked { winner: player, prize: 9 }
            .encode()
            .unwrap();
        assert_eq!(picked[0], 2);
        assert_eq!(LotteryEvent::decode(&picked).unwrap(), LotteryEvent::WinnerPicked {
            winner: player,
            prize: 9
        });
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(LotteryEvent::decode(&[7, 1, 2]).is_err());
    }
}
