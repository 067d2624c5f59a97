//! Core of a bitmap-index engine: segmented bitsets addressed by a 64-bit
//! key space, set algebra over them, and a naive planner that reduces a
//! predicate tree to a single result bitset.
#![deny(rust_2018_idioms)]

#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

#[cfg(test)]
pub mod test_utils;

pub mod context;
pub mod error;
pub mod index;
pub mod io;
pub mod name;
pub mod plan;
pub mod query;
pub mod segment;
pub mod serialize;
pub mod slice;

mod interner;
