// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::io;
use std::path::PathBuf;

/// Failures that can happen while a routine gathers data or drives a child
/// process. None of these escape a routine; each is folded into a terminal
/// status plus message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DiagError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {:?} read from {}", .value, .path.display())]
    Parse { path: PathBuf, value: String },

    #[error("invalid routine parameters: {0}")]
    InvalidParameters(String),

    #[error("no valid AC power supply found")]
    NoPowerSupply,

    #[error("design capacity read from {} is zero", .0.display())]
    ZeroDesignCapacity(PathBuf),

    #[error("capacity read from {} is out of range", .0.display())]
    CapacityOutOfRange(PathBuf),

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to kill process: {0}")]
    Kill(#[source] io::Error),
}
