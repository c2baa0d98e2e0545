pub mod file;
pub mod memory;
pub mod variant;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use variant::BlobStoreVariant;
