#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use atlas_tensor as tensor;

#[doc(inline)]
pub use atlas_algebra as algebra;

#[doc(inline)]
pub use atlas_lie as lie;
