#![warn(missing_debug_implementations)]
//! The `corridormap-types` library defines the primitive types shared by the
//! corridormap navigation crates.
//!
//! In most cases, you will only need to use this crate if you're a crate
//! author and want compatibility with the corridormap pipeline. Otherwise,
//! the [`corridormap`](https://crates.io/crates/corridormap) crate re-exports
//! these types and additionally provides the map construction and query
//! algorithms.
//!
//! ## Types
//!
//! - **[`Coord`]**: A two-dimensional coordinate with the usual vector-space
//!   operations. Every other type in this crate is composed of [`Coord`]s.
//! - **[`Rect`]**: An axis-aligned bounded rectangle represented by minimum
//!   and maximum [`Coord`]s.
//! - **[`Footprint`]**: A set of convex obstacle polygons, stored in
//!   counter-clockwise vertex order.
//!
//! ## Coordinates and Numeric Types
//!
//! By default, coordinates are 32-bit floating point numbers — the scalar
//! type consumed by render backends — but this is generic, and you may
//! specify any numeric type that implements [`CoordNum`] or [`CoordFloat`],
//! such as `f64`.
//!
//! # Features
//!
//! - `approx`: implements the [`approx`] comparison traits for [`Coord`]
//! - `serde`: allows the types in this crate to be serialized and
//!   deserialized with [Serde](https://serde.rs)

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

#[cfg(test)]
#[macro_use]
extern crate approx;

use core::fmt::Debug;
use num_traits::{Float, Num, NumCast};

/// For algorithms which can use both integer and floating point `Coord`s.
pub trait CoordNum: Num + Copy + NumCast + PartialOrd + Debug {}
impl<T: Num + Copy + NumCast + PartialOrd + Debug> CoordNum for T {}

/// For algorithms which only make sense for floating point, like tangent
/// construction or unit normals.
pub trait CoordFloat: CoordNum + Float {}
impl<T: CoordNum + Float> CoordFloat for T {}

#[macro_use]
mod macros;

mod coord;
mod error;
mod footprint;
mod rect;

pub use crate::coord::Coord;
pub use crate::error::Error;
pub use crate::footprint::Footprint;
pub use crate::rect::Rect;
