//! 切片对象及其上的矩形区域.

mod core;
mod iter;

pub use core::{RawSlice, Rescale, Slice, SliceMeta};
pub use iter::{Rect, RectIter};
