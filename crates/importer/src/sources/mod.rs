mod catalog;
mod legacy_votes;

pub use catalog::CatalogImporter;
pub use legacy_votes::LegacyVotesImporter;
