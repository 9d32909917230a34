#![doc = include_str!("../README.md")]

mod error;

pub mod decode;
pub mod event;
pub mod hexdump;
pub mod output;
pub mod packet;
pub mod raw;
pub mod sub20;
pub mod summary;
pub mod unpack;

pub use error::{Error, Result};
pub use summary::Summary;
