use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, LogHash};

/// Status half of `getWinner(index)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinnerStatus {
    Decided,
    NoMajority,
    NoSubmissionToday,
    Pending,
    Abandoned,
    NoWinnerForFutureDate,
}

impl fmt::Display for WinnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Decided => "Decided",
            Self::NoMajority => "NoMajority",
            Self::NoSubmissionToday => "NoSubmissionToday",
            Self::Pending => "Pending",
            Self::Abandoned => "Abandoned",
            Self::NoWinnerForFutureDate => "NoWinnerForFutureDate",
        };
        f.write_str(s)
    }
}

/// Resolved outcome of one log index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOutcome {
    Decided { winner: Address, hash: LogHash },
    NoMajority,
    NoSubmissionToday,
    Pending,
    Abandoned,
    NoWinnerForFutureDate,
}

impl DayOutcome {
    pub fn status(&self) -> WinnerStatus {
        match self {
            Self::Decided { .. } => WinnerStatus::Decided,
            Self::NoMajority => WinnerStatus::NoMajority,
            Self::NoSubmissionToday => WinnerStatus::NoSubmissionToday,
            Self::Pending => WinnerStatus::Pending,
            Self::Abandoned => WinnerStatus::Abandoned,
            Self::NoWinnerForFutureDate => WinnerStatus::NoWinnerForFutureDate,
        }
    }

    /// Winner address, or the zero address when there is none.
    pub fn winner(&self) -> Address {
        match self {
            Self::Decided { winner, .. } => *winner,
            _ => Address::ZERO,
        }
    }

    /// No later transaction can change a terminal outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::NoWinnerForFutureDate)
    }

    /// Outcomes whose daily emission nobody can claim.
    pub fn is_recyclable(&self) -> bool {
        matches!(self, Self::NoMajority | Self::NoSubmissionToday | Self::Abandoned)
    }
}
