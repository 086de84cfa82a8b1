pub mod export;

pub use export::{load_combined, load_combined_many, load_weather, merge_field_lists};
