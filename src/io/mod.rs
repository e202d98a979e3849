mod local;
mod walk;

pub use local::LocalFileReader;
pub use walk::{FileEntry, FileList, archive_name, collect};
