pub mod index;

pub use index::HabitatIndex;
