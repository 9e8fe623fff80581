//! Persisted program images.
//!
//! An image is a bincode-encoded `Program` behind a format version. The
//! version is bumped whenever the opcode table or operand encoding
//! changes, so stale images are rejected instead of misexecuted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::DecodeError;
use crate::program::Program;

/// Current image format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ProgramDecodeError {
    #[error("unsupported program image version {found} (expected {FORMAT_VERSION})")]
    Version { found: u32 },
    #[error("malformed program image: {0}")]
    Malformed(#[from] bincode::Error),
    #[error("program image holds invalid code: {0}")]
    InvalidCode(#[from] DecodeError),
}

#[derive(Serialize)]
struct ImageRef<'a> {
    version: u32,
    program: &'a Program,
}

#[derive(Deserialize)]
struct Image {
    version: u32,
    program: Program,
}

impl Program {
    /// Encode the program as a versioned image.
    pub fn to_image(&self) -> Result<Vec<u8>, ProgramDecodeError> {
        Ok(bincode::serialize(&ImageRef {
            version: FORMAT_VERSION,
            program: self,
        })?)
    }

    /// Decode and validate an image written by `to_image`.
    pub fn from_image(bytes: &[u8]) -> Result<Program, ProgramDecodeError> {
        // The version is the leading u32 of both layouts.
        let found: u32 = bincode::deserialize(bytes)?;
        if found != FORMAT_VERSION {
            return Err(ProgramDecodeError::Version { found });
        }
        let image: Image = bincode::deserialize(bytes)?;
        image.program.validate()?;
        Ok(image.program)
    }
}

#[cfg(test)]
mod tests;
