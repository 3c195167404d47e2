pub mod orientation;
pub mod swim_speed;
pub mod vertical;
pub mod von_mises;

pub use orientation::OrientationEngine;
pub use swim_speed::SwimSpeed;
pub use vertical::VerticalSchedule;
pub use von_mises::VonMises;
