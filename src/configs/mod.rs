pub mod base;
pub mod driver;
pub mod logging;
pub mod mixer;
pub mod output;
pub mod queue;
pub mod source;

pub use base::*;
pub use driver::*;
pub use logging::*;
pub use mixer::*;
pub use output::*;
pub use queue::*;
pub use source::*;
