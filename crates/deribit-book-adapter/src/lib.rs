/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public order book streaming crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod config;
pub mod error;
pub mod message;
pub mod report;
pub mod session;
pub mod sink;
pub mod state;
pub mod subscription;
pub mod tls;

pub use config::{SessionConfig, MAINNET_HOST, TESTNET_HOST};
pub use error::{DecodeError, Result, SessionError, Stage};
pub use report::report_failure;
pub use session::BookSession;
pub use sink::{ChannelSink, ConsoleSink, FeedEvent, FeedSink};
pub use state::SessionState;
pub use subscription::SubscriptionRequest;
