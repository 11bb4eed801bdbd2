//! # Type System
//!
//! The on-disk scalar type catalog ([`ScalarType`]) and the runtime value
//! representation ([`Value`]) produced by the record decoder.
//!
//! Scalar types are identified by their catalog `xtype` byte. Whether a
//! column is fixed-width depends on both the scalar type and the declared
//! length: a type from the fixed set with the variable-length sentinel
//! (`-1`) declared is still variable.

mod scalar;
mod value;

pub use scalar::{ScalarType, VAR_LENGTH_SENTINEL};
pub use value::{decode_utf16le, decode_utf16le_nul, DateTime, GeoTag, Value};
