pub mod step;

pub use step::{Census, Simulation};
