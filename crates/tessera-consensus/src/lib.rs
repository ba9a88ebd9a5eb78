pub mod engine;
pub mod lottery;
pub mod majority;
pub mod validator;

pub use engine::{ConsensusEngine, ConsensusEvent, IndexRecord, RandomnessRequest, Submission};
pub use lottery::pick_winner;
pub use majority::{compute_majority, MajorityRecord};
pub use validator::{ValidatorInfo, ValidatorSet};
