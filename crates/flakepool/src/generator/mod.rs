mod atomic;
mod interface;
mod state;

pub use atomic::*;
pub use interface::*;
