// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::routines as rt;
use rt::error::DiagError;

/// Directory holding one entry per power supply known to the kernel.
pub const POWER_SUPPLY_DIR: &str = "sys/class/power_supply";

/// Directory holding the attributes of the main battery.
pub const BATTERY_DIR: &str = "sys/class/power_supply/BAT0";

/// Reads a kernel attribute file and returns its contents without the
/// surrounding whitespace.
pub fn read_trimmed<P: AsRef<Path>>(path: P) -> Result<String, DiagError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| DiagError::Io {
        path: path.to_owned(),
        source,
    })?;
    Ok(content.trim().to_owned())
}

/// Reads a kernel attribute file and parses it as an integer.
pub fn read_integer<T, P>(path: P) -> Result<T, DiagError>
where
    T: FromStr,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let value = read_trimmed(path)?;
    value.parse::<T>().map_err(|_| DiagError::Parse {
        path: path.to_owned(),
        value,
    })
}

/// Lists the entries of a directory sorted by name, so that "first entry"
/// has a stable meaning across calls.
pub fn sorted_entries<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, DiagError> {
    let dir = dir.as_ref();
    let to_err = |source| DiagError::Io {
        path: dir.to_owned(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(to_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_err)?;
    entries.sort();
    Ok(entries)
}
