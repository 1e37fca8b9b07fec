use crate::tensor::{get_strides_from_shape, Tensor, TensorError};

/// The outcome of aligning one or two batched operands for a kernel call.
///
/// The operands are collapsed to a `(N, d)` layout where `N` is the product
/// of the common batch shape; `batch_shape` is kept so callers can restore
/// the batch axes on the kernel output.
#[derive(Debug, Clone)]
pub struct BroadcastedInputs {
    /// First operand, flattened to `(N, d1)`.
    pub lhs: Tensor,
    /// Second operand, flattened to `(N, d2)`, when present.
    pub rhs: Option<Tensor>,
    /// The common batch shape the flat axis was collapsed from.
    pub batch_shape: Vec<usize>,
}

/// Aligns two batch shapes by the standard broadcasting rule.
///
/// Shapes are compared from the trailing axis; a size-1 axis stretches to
/// match its partner and missing leading axes are treated as size 1.
///
/// # Errors
///
/// Returns [`TensorError::IncompatibleBroadcast`] when two aligned axes have
/// different sizes and neither is 1.
///
/// # Examples
///
/// ```rust
/// use atlas_tensor::broadcast_shapes;
///
/// let s = broadcast_shapes(&[5, 1], &[1, 7])?;
/// assert_eq!(s, [5, 7]);
/// assert!(broadcast_shapes(&[5], &[3]).is_err());
/// # Ok::<(), atlas_tensor::TensorError>(())
/// ```
pub fn broadcast_shapes(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>, TensorError> {
    let rank = lhs.len().max(rhs.len());
    let mut out = vec![1usize; rank];
    for i in 0..rank {
        // aligned from the trailing axis
        let l = if i < lhs.len() { lhs[lhs.len() - 1 - i] } else { 1 };
        let r = if i < rhs.len() { rhs[rhs.len() - 1 - i] } else { 1 };
        out[rank - 1 - i] = if l == r || r == 1 {
            l
        } else if l == 1 {
            r
        } else {
            return Err(TensorError::incompatible_broadcast(lhs, rhs));
        };
    }
    Ok(out)
}

/// Materializes a batched tensor to a target batch shape, keeping the
/// trailing coordinate axis, and collapses the batch axes to a single flat
/// axis of size `prod(batch)`.
fn expand_to_flat(t: &Tensor, batch: &[usize]) -> Result<Tensor, TensorError> {
    let coord = *t.shape.last().ok_or(TensorError::InvalidShape {
        expected: 1,
        actual: 0,
    })?;
    let src_batch = &t.shape[..t.shape.len() - 1];

    // re-check pairwise compatibility so this also guards the unary path
    let resolved = broadcast_shapes(src_batch, batch)?;
    if resolved != batch {
        return Err(TensorError::incompatible_broadcast(src_batch, batch));
    }

    let n: usize = batch.iter().product();
    let src_strides = get_strides_from_shape(&t.shape);
    let pad = batch.len() - src_batch.len();

    let mut data = Vec::with_capacity(n * coord);
    let src = t.as_slice();
    for flat in 0..n {
        // decompose the flat batch index and accumulate the source offset,
        // with stride 0 on stretched (size-1 or missing) source axes
        let mut rem = flat;
        let mut offset = 0usize;
        for axis in 0..batch.len() {
            let idx = if axis + 1 < batch.len() {
                let block: usize = batch[axis + 1..].iter().product();
                let i = rem / block;
                rem %= block;
                i
            } else {
                rem
            };
            if axis >= pad && src_batch[axis - pad] != 1 {
                offset += idx * src_strides[axis - pad];
            }
        }
        data.extend_from_slice(&src[offset..offset + coord]);
    }

    Ok(Tensor::from_shape_vec(&[n, coord], data)?.requires_grad_(t.requires_grad()))
}

/// Aligns two batched operands to their common batch shape and flattens
/// both to the `(N, d)` kernel layout.
///
/// # Errors
///
/// Returns [`TensorError::IncompatibleBroadcast`] when the operand batch
/// shapes cannot be aligned.
pub fn broadcast_pair(x: &Tensor, y: &Tensor) -> Result<(Tensor, Tensor, Vec<usize>), TensorError> {
    let x_batch = &x.shape[..x.shape.len().saturating_sub(1)];
    let y_batch = &y.shape[..y.shape.len().saturating_sub(1)];
    let batch_shape = broadcast_shapes(x_batch, y_batch)?;
    let lhs = expand_to_flat(x, &batch_shape)?;
    let rhs = expand_to_flat(y, &batch_shape)?;
    Ok((lhs, rhs, batch_shape))
}

/// Resolves the common batch shape of one or two batched operands and
/// produces the flattened `(N, d)` views a batched kernel consumes.
///
/// This is invoked before every kernel call. The unary case passes `None`
/// for the second operand.
///
/// # Errors
///
/// Returns [`TensorError::IncompatibleBroadcast`] when the operand batch
/// shapes cannot be aligned.
pub fn broadcast_inputs(x: &Tensor, y: Option<&Tensor>) -> Result<BroadcastedInputs, TensorError> {
    match y {
        Some(y) => {
            let (lhs, rhs, batch_shape) = broadcast_pair(x, y)?;
            Ok(BroadcastedInputs {
                lhs,
                rhs: Some(rhs),
                batch_shape,
            })
        }
        None => {
            let batch_shape = x.shape[..x.shape.len().saturating_sub(1)].to_vec();
            let lhs = expand_to_flat(x, &batch_shape)?;
            Ok(BroadcastedInputs {
                lhs,
                rhs: None,
                batch_shape,
            })
        }
    }
}
