#![warn(rust_2018_idioms)]

// re-export sub-crates
pub use rtp;
pub use util;

pub mod api;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod receiver;
pub mod renderer;
pub mod state;
pub mod stats;
pub mod track;
pub mod video_frame;

mod snapshot;

pub use error::Error;

#[macro_use]
extern crate lazy_static;
