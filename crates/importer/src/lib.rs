pub mod error;
pub mod sources;
pub mod traits;

pub use error::{ImporterError, Result};
pub use sources::{CatalogImporter, LegacyVotesImporter};
pub use traits::{DataImporter, ImportContext, ImportReport};
