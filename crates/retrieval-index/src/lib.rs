pub mod embedder;
pub mod index;


pub use embedder::*;
pub use index::*;
