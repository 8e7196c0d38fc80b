#![warn(unused_extern_crates)]

#[macro_use]
extern crate lazy_static;

pub mod config;
pub mod process;
pub mod review;
pub mod url;

pub use url::{parse, ParseError, RemoteUrl};
