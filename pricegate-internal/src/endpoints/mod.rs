use crate::error::{Error, ErrorDetails};

pub mod prices;
pub mod status;

/// Validate a US zip code: exactly five ASCII digits.
pub fn validate_zip(zip_code: &str) -> Result<(), Error> {
    if zip_code.len() == 5 && zip_code.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(());
    }
    Err(Error::new(ErrorDetails::InvalidRequest {
        message: format!("Invalid zip code: {zip_code}"),
    }))
}
