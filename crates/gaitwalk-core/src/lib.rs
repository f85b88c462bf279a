//! # gaitwalk-core
//!
//! Core primitives for the gaitwalk video pipeline.
//!
//! This crate provides:
//! - [`Tensor`] — dense, contiguous f32 n-dimensional array
//! - [`Shape`] — n-dimensional shape with row-major strides
//! - [`Error`] / [`Result`] — unified error type across the workspace

pub mod error;
pub mod shape;
pub mod tensor;

pub use error::{Error, Result};
pub use shape::Shape;
pub use tensor::Tensor;
