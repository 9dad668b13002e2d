//! Extraction parsers (§4.F/G/H): pure functions over already-fetched HTML,
//! no network calls of their own.

pub mod detail_parser;
pub mod listing_parser;
pub mod map_parser;

pub use detail_parser::DetailParser;
pub use listing_parser::ListingParser;
pub use map_parser::MapParser;
