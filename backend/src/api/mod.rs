mod catchers;
pub mod health;
pub mod search;

pub use catchers::*;
pub use health::*;
pub use search::*;
