pub mod change;
pub mod regression;
pub mod runs;
pub mod thresholds;

pub use change::{ratio, relative_change};
pub use regression::{mean, normalized_slope, slope};
pub use runs::has_descending_run;
