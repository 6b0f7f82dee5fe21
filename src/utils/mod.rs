//! Shared helpers: lazy materialization primitives and integer helpers.

mod lazy;
mod math;

pub use lazy::{ItemList, LazySlot, LazyValue};
pub use math::{align_to, align_to_4, to_u32};
