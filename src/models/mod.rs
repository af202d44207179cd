pub mod clip;
pub mod gentle;
pub mod word;

pub use clip::*;
pub use gentle::*;
pub use word::*;
