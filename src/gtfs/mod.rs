pub mod archive;
pub mod models;
pub mod parser;
pub mod schema;

pub use archive::*;
pub use models::*;
pub use parser::*;
pub use schema::*;
