pub mod error;
pub mod output;
pub mod settings;

pub use error::*;
pub use output::*;
pub use settings::*;
