//! Collection of raw system counters from the `/proc` filesystem.

pub mod mock;
pub mod parser;
pub mod system;
pub mod traits;

pub use system::{CollectError, SystemCollector};
pub use traits::{FileSystem, RealFs};
