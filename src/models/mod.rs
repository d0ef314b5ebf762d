mod analysis;
mod idea;

pub use analysis::{Analysis, BLUEPRINT_KEYS};
pub use idea::{
    AnalyzeRequest, AnalyzeResponse, ErrorBody, Idea, IdeaFields, UserProfile, STATUS_PENDING,
};
