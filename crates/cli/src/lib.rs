//! NOTONOTO fonts CLI library.

pub mod cli;
