//! Rule-based building blocks shared by the field and line-item extractors.

pub mod amounts;
pub mod patterns;

pub use amounts::{format_amount, line_total, parse_amount, strip_thousands};
pub use patterns::{ordinal_len, starts_with_ordinal, strip_ordinal};
