pub mod batch;
pub mod checksum_list;
pub mod csv_validator;
pub mod error;
pub mod generate;
pub mod hashing;
pub mod json_validator;
pub mod manifest;
pub mod path_safety;
pub mod validation;
pub mod verify;

pub use error::{Error, Result};
