//! Output generation for the audit run.
//!
//! # Submodules
//!
//! - [`csv`]: Reads the company registry and writes it back enriched with
//!   audit and score columns
//! - [`json`]: Writes the ranked prospect report
//!
//! # Output Structure
//!
//! ```text
//! audit.csv         # every input row, input columns + audit + score
//! classement.json   # scored prospects only, best first (optional)
//! ```

pub mod csv;
pub mod json;
