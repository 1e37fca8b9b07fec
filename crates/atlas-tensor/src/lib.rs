#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `atlas-tensor` provides the batched array container used by the Lie group
//! layers above it. A [`Tensor`] is a dynamically shaped, row-major `f32`
//! array whose trailing axis holds per-element coordinates and whose leading
//! axes form the *batch shape*. The [`broadcast`] module aligns the batch
//! shapes of one or two operands per the standard broadcasting rule and
//! flattens them into the `(N, d)` layout that batched kernels consume.
//!
//! The container also carries a `requires_grad` marker so that a downstream
//! autodiff engine can tell which results must stay attached to its graph.
//! The marker is plain metadata here: operations combine it with a logical OR
//! and [`Tensor::detach`] clears it.
//!
//! # Quick Start
//!
//! ```rust
//! use atlas_tensor::Tensor;
//!
//! let t = Tensor::from_shape_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//! assert_eq!(t.shape, [2, 3]);
//! assert_eq!(t.numel(), 6);
//! # Ok::<(), atlas_tensor::TensorError>(())
//! ```

/// Batch shape alignment and flattening for kernel calls.
pub mod broadcast;

/// The dynamically shaped tensor container and its error type.
pub mod tensor;

pub use broadcast::{broadcast_inputs, broadcast_pair, broadcast_shapes, BroadcastedInputs};
pub use tensor::{get_strides_from_shape, Tensor, TensorError};
