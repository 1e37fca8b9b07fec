use thiserror::Error;

use crate::group::GroupType;
use atlas_tensor::TensorError;

/// An error type for batched Lie group operations.
#[derive(Error, Debug, PartialEq)]
pub enum LieError {
    /// The trailing coordinate axis does not match the group type.
    ///
    /// Raised at container construction and whenever an operand's coordinate
    /// axis disagrees with what the operation requires.
    #[error("Dimension invalid: trailing axis must be {expected}, got {actual}")]
    DimensionInvalid {
        /// Coordinate size the group type declares.
        expected: usize,
        /// Trailing axis size of the offending array.
        actual: usize,
    },

    /// The operation does not exist on this representation.
    ///
    /// `exp` is only defined on tangent types and `log` only on manifold
    /// types; group-valued operations such as `mul` require manifold
    /// operands. These calls are surfaced immediately, never coerced.
    #[error("operation `{op}` is not applicable to the {gtype} representation")]
    InvalidRepresentation {
        /// Name of the rejected operation.
        op: &'static str,
        /// The representation it was called on.
        gtype: GroupType,
    },

    /// A binary operation was attempted across two different group tags.
    #[error("group mismatch: cannot combine {lhs} with {rhs}")]
    GroupMismatch {
        /// Tag of the left operand.
        lhs: GroupType,
        /// Tag of the right operand.
        rhs: GroupType,
    },

    /// A point batch passed to `act` has an unsupported trailing axis.
    #[error("points must have 3 or 4 trailing components, got {actual}")]
    InvalidPointShape {
        /// Trailing axis size of the point batch.
        actual: usize,
    },

    /// A shape error bubbled up from the tensor layer, typically a failed
    /// batch-shape broadcast.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}
