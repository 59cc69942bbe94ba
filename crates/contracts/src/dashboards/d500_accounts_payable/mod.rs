pub mod dto;
pub mod record;
pub mod selection;

pub use dto::*;
pub use record::*;
pub use selection::*;
