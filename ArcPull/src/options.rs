//! Options for bulk extraction
//!
//! Single-entry extraction takes its few knobs as arguments; extracting a
//! whole archive (or a batch of archives) goes through [`ExtractOptions`].

/// Options controlling how an archive is extracted to disk.
///
/// # Example
///
/// ```
/// use arcpull::ExtractOptions;
///
/// let options = ExtractOptions::new()
///     .with_overwrite(true)
///     .with_preserve_timestamps(false)
///     .with_password(Some("hunter2".to_string()));
/// assert!(options.overwrite);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Replace files that already exist at the destination.
    /// Default: false (existing files are skipped)
    pub overwrite: bool,

    /// Set each extracted file's modification time to the entry's last-write time.
    /// Default: true
    pub preserve_timestamps: bool,

    /// Password for encrypted entries. Takes precedence over a password the
    /// archive was opened with.
    pub password: Option<String>,
}

impl ExtractOptions {
    /// Create options with the defaults: skip existing files, keep timestamps, no password.
    #[must_use]
    pub fn new() -> Self {
        Self {
            overwrite: false,
            preserve_timestamps: true,
            password: None,
        }
    }

    /// Set whether existing files are replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set whether entry timestamps are applied to extracted files.
    #[must_use]
    pub fn with_preserve_timestamps(mut self, preserve: bool) -> Self {
        self.preserve_timestamps = preserve;
        self
    }

    /// Set the password used to open encrypted entries.
    #[must_use]
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}
