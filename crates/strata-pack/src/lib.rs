//! Binary package codec for Strata.
//!
//! Encodes a package's configuration object parts into a single buffer and
//! reads them back with a lazy, partially-asynchronous pipeline.
//!
//! # Architecture
//!
//! - **PackageWriter**: interns strings, collects the types and the
//!   properties actually used, and assembles the sections in the order the
//!   reader needs them
//! - **read_package**: parses header, primary strings, and object index
//!   synchronously and returns immediately; a background task decodes the
//!   type table, secondary strings, and data blocks
//! - **ObjectPart**: per-object placeholder; `open` blocks (bounded) until
//!   its data arrives, then decodes values and binds the type through the
//!   injected [`TypeBinder`](strata_bind::TypeBinder) capability
//!
//! Background failures are captured, empty payloads unblock every waiter,
//! and the error re-surfaces from each affected part's `open`.

pub mod config;
pub mod error;
mod format;
pub mod part;
pub mod reader;
pub mod writer;

pub use config::DecodeConfig;
pub use error::{PackError, PackResult};
pub use part::ObjectPart;
pub use reader::{read_package, read_package_file, DecodedPackage};
pub use writer::PackageWriter;
