// (c) diagd developers.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::routines as rt;
use rt::process::{ProcessAdapter, TokioProcessAdapter};
use rt::RoutineKind;

pub const DEFAULT_SMARTCTL_CHECK_PATH: &str = "/usr/libexec/diagnostics/smartctl-check";
pub const DEFAULT_URANDOM_PATH: &str = "/usr/libexec/diagnostics/urandom";

/// Source of "now" for progress estimation.
pub trait TimestampProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz>;
}

struct ConfiguredTzProvider {
    tz: chrono_tz::Tz,
}

impl TimestampProvider for ConfiguredTzProvider {
    fn now(&self) -> chrono::DateTime<chrono_tz::Tz> {
        chrono::Local::now().with_timezone(&self.tz)
    }
}

/// The configuration repository for the routine engine.
pub struct Config {
    pub(crate) sysfs_root: PathBuf,
    pub(crate) smartctl_check_path: PathBuf,
    pub(crate) urandom_path: PathBuf,
    pub(crate) available_routines: Option<Vec<RoutineKind>>,
    pub(crate) process_adapter: Arc<dyn ProcessAdapter + Send + Sync + 'static>,
    pub(crate) timestamp_provider: Arc<dyn TimestampProvider + Send + Sync + 'static>,
}

impl Config {
    /// Creates a new [`ConfigBuilder`]
    ///
    /// # Examples
    /// ```rust
    /// # use diagd::routines::*;
    ///
    /// let builder = Config::builder();
    /// ```
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn sysfs_root(&self) -> &Path {
        &self.sysfs_root
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// The builder for the [`Config`] object.
pub struct ConfigBuilder {
    timezone: Option<chrono_tz::Tz>,
    sysfs_root: Option<PathBuf>,
    smartctl_check_path: Option<PathBuf>,
    urandom_path: Option<PathBuf>,
    available_routines: Option<Vec<RoutineKind>>,
    process_adapter: Option<Arc<dyn ProcessAdapter + Send + Sync + 'static>>,
    timestamp_provider: Option<Arc<dyn TimestampProvider + Send + Sync + 'static>>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            timezone: None,
            sysfs_root: None,
            smartctl_check_path: None,
            urandom_path: None,
            available_routines: None,
            process_adapter: None,
            timestamp_provider: None,
        }
    }

    pub fn timezone(mut self, timezone: chrono_tz::Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }

    /// Directory that kernel paths such as `sys/class/power_supply` are
    /// resolved against. Defaults to `/`.
    pub fn sysfs_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.sysfs_root = Some(root.as_ref().to_owned());
        self
    }

    pub fn smartctl_check_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.smartctl_check_path = Some(path.as_ref().to_owned());
        self
    }

    pub fn urandom_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.urandom_path = Some(path.as_ref().to_owned());
        self
    }

    /// Overrides the probed list of routines supported by this device.
    pub fn available_routines(mut self, kinds: &[RoutineKind]) -> Self {
        self.available_routines = Some(kinds.to_vec());
        self
    }

    pub fn with_process_adapter(
        mut self,
        adapter: Arc<dyn ProcessAdapter + Send + Sync + 'static>,
    ) -> Self {
        self.process_adapter = Some(adapter);
        self
    }

    pub fn with_timestamp_provider(
        mut self,
        timestamp_provider: Arc<dyn TimestampProvider + Send + Sync + 'static>,
    ) -> Self {
        self.timestamp_provider = Some(timestamp_provider);
        self
    }

    pub fn build(self) -> Config {
        let timezone = self.timezone.unwrap_or(chrono_tz::UTC);
        Config {
            sysfs_root: self.sysfs_root.unwrap_or_else(|| PathBuf::from("/")),
            smartctl_check_path: self
                .smartctl_check_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SMARTCTL_CHECK_PATH)),
            urandom_path: self
                .urandom_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_URANDOM_PATH)),
            available_routines: self.available_routines,
            process_adapter: self
                .process_adapter
                .unwrap_or_else(|| Arc::new(TokioProcessAdapter::new())),
            timestamp_provider: self
                .timestamp_provider
                .unwrap_or_else(|| Arc::new(ConfiguredTzProvider { tz: timezone })),
        }
    }
}
