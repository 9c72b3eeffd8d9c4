//! Question filtering, quiz sampling and the add-question wizard

pub mod enumeration;
pub mod events;
pub mod field;
pub mod filters;
pub mod model;
pub mod sampler;
pub mod service;
pub mod wizard;

pub use events::{Action, InboundEvent, Keyboard, PollRequest, Presentation, Reply, ReplyOption, TextReply};
pub use field::ClassificationField;
pub use filters::FilterSessionManager;
pub use model::{Classification, ClassificationRecord, FilterState, NewRecord};
pub use service::QuizService;
pub use wizard::{ConversationState, RecordDraft, Wizard, WizardStep};
