#![forbid(unsafe_code)]

pub mod cli;
pub mod dot;
pub mod error;
pub mod graph;
pub mod util;
