//! Identifier layout, generation, and external encoding.

pub mod base58;
pub mod snowflake;
