pub mod reader;
pub mod traits;

pub use reader::{FileReader, MemoryReader};
pub use traits::{SourceReader, SourceRequest};
