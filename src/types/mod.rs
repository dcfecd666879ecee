//! Value types for lamp control parameters.

mod alert;
mod brightness;
mod color;
mod lamp;
mod power;

pub use alert::AlertMode;
pub use brightness::Brightness;
pub use color::Color;
pub use lamp::{LampId, LampSet};
pub use power::PowerMode;
