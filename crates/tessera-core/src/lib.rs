pub mod account;
pub mod constants;
pub mod error;
pub mod history;
pub mod interfaces;
pub mod math;
pub mod outcome;
pub mod ticket;
pub mod transaction;
pub mod types;

pub use account::{Account, TokenBalances};
pub use constants::*;
pub use error::TesseraError;
pub use history::{Checkpoints, DayHistory};
pub use interfaces::{
    DayClock, FixedClock, OutcomeView, StakeView, TokenLedger, ValidatorRegistry, WallClock,
};
pub use outcome::{DayOutcome, WinnerStatus};
pub use ticket::{DeltaTicket, TicketClaim, TicketKind};
pub use transaction::{Action, Role, Transaction};
pub use types::*;
