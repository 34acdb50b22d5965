pub mod pattern_detector;
pub mod scanner;
pub mod signals;

pub use pattern_detector::PatternDetector;
pub use scanner::{Opportunity, Scanner};
pub use signals::Signal;
