// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! Tags, virtual tags and the algebra that derives virtual tag series.

mod evaluation;
mod index;
pub(crate) mod inference;
mod operations;
mod tag;
mod tag_set;
mod virtual_tag;

pub use evaluation::SeriesSource;
pub use index::{TagIndex, TagRef};
pub use operations::{BinaryOp, Operator, UnaryOp};
pub use tag::{Tag, UnitId};
pub use tag_set::TagSet;
pub(crate) use virtual_tag::Inferred;
pub use virtual_tag::{Operand, VirtualTag};
