pub mod bar;
pub mod direction;

pub use bar::{Bar, BarSeries, SeriesError};
pub use direction::*;
