pub mod workflow;

pub use workflow::{
    CorrectionProposal, CorrectionWorkflow, ReviewAction, ReviewOutcome, MIN_REASON_LENGTH,
};
