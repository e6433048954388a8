//! Filtering and comparison over a loaded attendance dataset.
//!
//! Every function here is pure: it borrows the dataset (or a selection of
//! it) and returns a new [`Selection`](crate::models::Selection) or summary.

pub mod extremes;
pub mod filters;
pub mod quarters;
pub mod window;

pub use extremes::{Extreme, find_extremes};
pub use filters::{filter_by_dates, filter_by_special, filter_special_present};
pub use quarters::compare_quarters;
pub use window::{DateWindow, Quarter, TimeRange, filter_by_time_range};
