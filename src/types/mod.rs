//! Shared data types.

pub mod chat;
pub mod game;

pub use chat::{ChatMessage, ChatReply, Role};
pub use game::{
    AnalysisOutcome, AnalysisRow, Chemistry, Compatibility, Feedback, IdealMatch, NewChatLog,
    NewGameSession, NewUser, PlayerProfile, RecordId, RoundRecord, SessionAnalysis,
    SessionOutcome,
};
