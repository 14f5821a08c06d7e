//! Corpus pipeline: line sources, date-qualified preprocessing, the embedded corpus and its
//! CSV persistence.

pub mod dates;
mod fragment;
mod preprocess;
pub mod source;
mod store;

pub use fragment::{Corpus, Fragment};
pub use preprocess::Preprocessor;
pub use source::CorpusSource;
pub use store::{format_embedding, parse_embedding, CorpusStore, CsvCorpusStore};
