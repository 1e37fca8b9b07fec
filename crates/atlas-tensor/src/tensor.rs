use thiserror::Error;

/// An error type for tensor operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    ///
    /// Raised when creating a tensor with data whose length is not the
    /// product of the requested shape dimensions.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on the shape.
        expected: usize,
        /// Actual number of elements in the data.
        actual: usize,
    },

    /// Two batch shapes cannot be broadcast against each other.
    ///
    /// Broadcasting aligns shapes from the trailing axis; a size-1 axis
    /// stretches to match its partner, and any other size mismatch is an
    /// error. Data is never silently truncated or padded.
    #[error("Incompatible broadcast: cannot align batch shapes {lhs} and {rhs}")]
    IncompatibleBroadcast {
        /// Left-hand batch shape, formatted.
        lhs: String,
        /// Right-hand batch shape, formatted.
        rhs: String,
    },

    /// Index exceeds tensor bounds.
    #[error("Index {index} out of bounds for tensor with {numel} elements")]
    IndexOutOfBounds {
        /// The invalid flat index that was attempted.
        index: usize,
        /// Number of elements in the tensor.
        numel: usize,
    },
}

impl TensorError {
    /// Creates an `IncompatibleBroadcast` error from two batch shapes.
    pub fn incompatible_broadcast(lhs: &[usize], rhs: &[usize]) -> Self {
        Self::IncompatibleBroadcast {
            lhs: format!("{lhs:?}"),
            rhs: format!("{rhs:?}"),
        }
    }
}

/// Computes the strides for a row-major (C-contiguous) tensor layout.
///
/// The rightmost dimension has stride 1 and each dimension's stride is the
/// product of all dimensions to its right.
///
/// # Examples
///
/// ```rust
/// use atlas_tensor::get_strides_from_shape;
///
/// assert_eq!(get_strides_from_shape(&[2, 3]), [3, 1]);
/// assert_eq!(get_strides_from_shape(&[2, 3, 4]), [12, 4, 1]);
/// ```
pub fn get_strides_from_shape(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0usize; shape.len()];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// A dynamically shaped, row-major `f32` array with a gradient marker.
///
/// The tensor owns its data in a contiguous buffer. The shape is dynamic
/// (`Vec<usize>`) because batch ranks are decided at runtime by callers; the
/// trailing axis is conventionally the per-element coordinate axis of the Lie
/// layers built on top.
///
/// `requires_grad` is propagated metadata for an external autodiff engine:
/// construction leaves it `false`, [`Tensor::requires_grad_`] sets it and
/// [`Tensor::detach`] clears it. This crate performs no differentiation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    /// The shape of the tensor.
    pub shape: Vec<usize>,
    data: Vec<f32>,
    requires_grad: bool,
}

impl Tensor {
    /// Creates a tensor from a shape and a data vector.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if the data length is not the
    /// product of the shape dimensions.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>) -> Result<Self, TensorError> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(TensorError::InvalidShape {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape: shape.to_vec(),
            data,
            requires_grad: false,
        })
    }

    /// Creates a tensor filled with a single value.
    pub fn from_shape_val(shape: &[usize], value: f32) -> Self {
        let numel = shape.iter().product::<usize>();
        Self {
            shape: shape.to_vec(),
            data: vec![value; numel],
            requires_grad: false,
        }
    }

    /// Creates a tensor of zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::from_shape_val(shape, 0.0)
    }

    /// Creates a tensor by tiling a coordinate row over a batch shape.
    ///
    /// The result has shape `batch + [row.len()]` with every batch entry
    /// holding a copy of `row`.
    pub fn from_batch_row(batch: &[usize], row: &[f32]) -> Self {
        let n = batch.iter().product::<usize>();
        let mut shape = batch.to_vec();
        shape.push(row.len());
        let mut data = Vec::with_capacity(n * row.len());
        for _ in 0..n {
            data.extend_from_slice(row);
        }
        Self {
            shape,
            data,
            requires_grad: false,
        }
    }

    /// Returns the total number of elements.
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Returns the tensor data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the tensor data as a mutable slice.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the tensor and returns the underlying vector.
    #[inline]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Returns the element at a flat index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&f32> {
        self.data.get(index)
    }

    /// Reinterprets the tensor with a new shape of the same element count.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::InvalidShape`] if the element counts differ.
    pub fn reshape(mut self, shape: &[usize]) -> Result<Self, TensorError> {
        let expected = shape.iter().product::<usize>();
        if expected != self.data.len() {
            return Err(TensorError::InvalidShape {
                expected,
                actual: self.data.len(),
            });
        }
        self.shape = shape.to_vec();
        Ok(self)
    }

    /// Applies a function to every element, producing a new tensor.
    ///
    /// The gradient marker carries over to the result.
    pub fn map<F: FnMut(f32) -> f32>(&self, f: F) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().copied().map(f).collect(),
            requires_grad: self.requires_grad,
        }
    }

    /// Returns whether this tensor is marked for gradient tracking.
    #[inline]
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Sets the gradient-tracking marker, builder style.
    #[inline]
    pub fn requires_grad_(mut self, requires_grad: bool) -> Self {
        self.requires_grad = requires_grad;
        self
    }

    /// Clears the gradient-tracking marker, yielding a fresh leaf value.
    #[inline]
    pub fn detach(mut self) -> Self {
        self.requires_grad = false;
        self
    }
}
