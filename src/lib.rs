#[macro_use]
extern crate log;

mod dbglib;
pub use self::dbglib::*;
