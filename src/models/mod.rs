//! Plain value types shared by the store, the datalog codec and the CLI.

pub mod channel;
pub mod lap;
pub mod sample;
pub mod session;

pub use channel::Channel;
pub use lap::Lap;
pub use sample::Sample;
pub use session::Session;
