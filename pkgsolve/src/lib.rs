#![doc = include_str!("../README.md")]

mod closure;
mod diagnostics;
mod error;
mod resolver;
mod sat;

pub use diagnostics::topo_sort;
pub use error::Error;
pub use resolver::Resolver;
