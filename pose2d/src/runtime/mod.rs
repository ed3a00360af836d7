mod dynamics;
mod rigid;
mod session;
mod skeleton;

pub use dynamics::*;
pub use rigid::*;
pub use session::*;
pub use skeleton::*;




#[cfg(test)]
mod session_tests;
