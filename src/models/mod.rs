pub mod enums;
pub mod medication;
pub mod note;

pub use enums::*;
pub use medication::*;
pub use note::*;
