mod animation;
mod config;
mod geometry;
pub mod hover;
mod monitor;
pub mod proximity;
mod tracking;
pub mod wrap;

pub use animation::*;
pub use config::*;
pub use geometry::*;
pub use hover::*;
pub use monitor::*;
pub use proximity::*;
pub use tracking::*;
pub use wrap::*;

pub type WindowId = u32;
