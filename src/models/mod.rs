pub mod build;
pub mod change;
pub mod commit;
pub mod tally;

pub use build::*;
pub use change::*;
pub use commit::*;
pub use tally::*;
