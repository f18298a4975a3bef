pub mod ranker;
pub mod signals;


pub use ranker::*;
pub use signals::*;
