//! Front-ends that turn classified gesture and speech events into
//! controller calls.

mod gesture;
mod speech;

pub use gesture::{Gesture, GestureDispatcher};
pub use speech::{NamedColor, SpeechCommand, SpeechDispatcher};
