pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod io;
pub mod plot;
pub mod record;
pub mod selection;

pub use aggregate::*;
pub use error::*;
pub use filter::*;
pub use io::dataset::Dataset;
pub use record::*;
pub use selection::*;
