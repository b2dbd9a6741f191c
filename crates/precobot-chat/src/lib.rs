pub mod protocol;
pub mod router;
pub mod server;

pub use protocol::{InboundMessage, OutboundReply};
pub use router::Router;
pub use server::run_server;
