pub mod filesystem;
pub mod output;

pub use filesystem::{generated_name, FileLifecycle};
pub use output::{OutputSettings, TempOutput};
