//! Installation service wire shapes: outbound commands and inbound status messages.

pub mod command;
pub mod response;

pub use command::{Command, CommandName};
pub use response::{DeviceError, ResponseMessage, Signal};
