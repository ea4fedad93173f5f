//! # Commands Module
//!
//! One module per subcommand family. Commands take the state they need
//! and return serializable results; `run` prints them.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── form.rs       ◄─── evaluate
//! ├── countries.rs  ◄─── countries
//! └── labels.rs     ◄─── labels list / import / clear
//! ```

pub mod countries;
pub mod form;
pub mod labels;
