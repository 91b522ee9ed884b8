pub mod message;
pub mod reply;
pub mod session;
pub mod user;

pub use message::{Message, Role};
pub use reply::{PromptReply, ReplyStatus, UiElement, UiElementKind};
pub use session::{ChatSession, SessionSummary};
pub use user::User;
