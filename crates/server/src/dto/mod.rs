mod feature;
mod upload;

pub use feature::*;
pub use upload::*;
