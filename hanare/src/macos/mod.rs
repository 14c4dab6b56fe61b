mod accessibility;
mod display;
mod input;

pub use accessibility::*;
pub use display::*;
pub use input::*;
