//! CLI commands module.

mod policy;
mod prints;
mod util;

pub use policy::{AssessCommand, PinHashCommand, PolicyCommand};
pub use prints::{
    DeleteCommand, EnrollCommand, IdentifyCommand, ListCommand, UpdateCommand, VerifyCommand,
};

pub(crate) use util::*;
