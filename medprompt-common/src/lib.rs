//! Shared leaf utilities for the medprompt workspace
//!
//! Property labels travel in two forms: a human display label
//! ("Presenter Name") and a canonical machine key ("presenter_name") used in
//! template placeholders and JSON records. The `naming` module owns that
//! reversible transliteration. The `dates` module owns the single date
//! format every record and rendered prompt uses.

pub mod dates;
pub mod naming;

pub use dates::{format_date, parse_date, DateParseError, DATE_FORMAT};
pub use naming::{from_canonical, to_canonical};
