mod entity;
mod enums;
mod player;
mod sweep;

pub use entity::*;
pub use enums::*;
pub use player::*;
pub use sweep::*;
