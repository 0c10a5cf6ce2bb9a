pub mod builder;
pub mod handle;
pub mod model;

pub use builder::FileBuilder;
pub use handle::FileHandle;
pub use model::{File, FileState, Status};
