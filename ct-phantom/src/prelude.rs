//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{idx_to_point, Idx2d, Point};

pub use crate::config::{LocatorConfig, PhantomConfig, Tolerances};
pub use crate::data::{RawSlice, Rescale, SeriesInfo, Slice, SliceMeta, SliceStack};
pub use crate::error::{PhantomError, PhantomResult};
pub use crate::geometry::{midpoint_and_rotation, Geometry};
pub use crate::locate::{locate_landmarks, BandProfile, LandmarkSet, Module};
pub use crate::measure::{measure_all, MeasurementRecord, Outcome, Reading, Unit, Verdict};
pub use crate::pipeline::analyze_stack;
pub use crate::report::PhantomReport;
pub use crate::roi::{masked_stats, Annulus, Disk, LineProfile, Roi, RoiStats};

#[cfg(feature = "io")]
pub use crate::dataset::load_series;
#[cfg(feature = "io")]
pub use crate::pipeline::analyze_dir;
