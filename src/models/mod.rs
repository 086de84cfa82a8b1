pub mod combined;
pub mod field;
pub mod growth_stage;
pub mod recommendation;
pub mod spray;
pub mod weather;

pub use combined::*;
pub use field::*;
pub use growth_stage::*;
pub use recommendation::*;
pub use spray::*;
pub use weather::*;
