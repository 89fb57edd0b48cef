//! Client-side conversation state.
//!
//! - [`SessionRegister`]: the one current session identity shared by the
//!   chat and upload transports

pub mod session;

pub use session::SessionRegister;
