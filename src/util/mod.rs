//! Utility functions shared by the parser, normalizer and writer.
//!
//! - **Text sanitizing**: strip characters that cannot appear in XML 1.0 so
//!   that malformed sources never produce an ill-formed output document

mod text;

pub use text::{clean_field, sanitize_xml_text};
