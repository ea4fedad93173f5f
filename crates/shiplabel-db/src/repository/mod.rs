//! Repositories over the order metadata tables.
//!
//! One per stored concern; today that is [`labels::LabelMetaRepository`].

pub mod labels;
