//! # Record Decoding
//!
//! [`Record`] joins a parsed leaf row with its [`UserTable`] and decodes
//! columns to [`Value`]s. Decoding is a pure function of the row bytes and
//! the table descriptor:
//!
//! 1. NULL bitmap bit set → [`Value::Null`].
//! 2. Fixed column → slice `[fixed_offset, fixed_offset + fixed_size)` of
//!    the row, interpreted per scalar type (little-endian integers, IEEE-754
//!    floats, day/tick datetimes, UTF-16LE fixed chars).
//! 3. Variable column → payload located through the variable-offset trailer;
//!    complex payloads (LOB and row-overflow pointers) come back as tagged
//!    byte ranges rather than being followed.

mod record;

pub use record::Record;
