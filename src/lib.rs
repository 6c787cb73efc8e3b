pub mod constants;
pub mod endpoint;
pub mod error;
pub mod escape;
pub mod input;
pub mod pending;
pub mod reply;
pub mod session;
pub mod transcript;
pub mod turn;

pub use endpoint::{ChatEndpoint, EndpointConfig, HttpChatEndpoint};
pub use error::TurnError;
pub use input::{InputAction, InputBuffer};
pub use reply::InboundReply;
pub use session::{ChatSession, TurnState};
pub use transcript::{Transcript, TranscriptSurface};
pub use turn::{RenderedTurn, Role, Turn};
