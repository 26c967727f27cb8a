pub mod memory;

#[cfg(feature = "appwrite")]
pub mod appwrite;

pub use memory::MemoryProfileStore;

#[cfg(feature = "appwrite")]
pub use appwrite::AppwriteProfileStore;
