//! Build and runtime information for log lines and bug reports.
use std::fmt;

/// Crate version and the size of the rayon pool used for event reductions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitInfo {
    pub version: &'static str,
    pub threads: usize,
}

impl fmt::Display for FitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rust_unbinned {} ({} worker threads)", self.version, self.threads)
    }
}

/// Snapshot of [`FitInfo`]. Nothing is printed; callers decide where it goes.
pub fn fit_info() -> FitInfo {
    FitInfo { version: env!("CARGO_PKG_VERSION"), threads: rayon::current_num_threads() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // The snapshot reports the package version and a usable pool size.
    //
    // Given
    // -----
    // - The global rayon pool.
    //
    // Expect
    // ------
    // - `version` equals `CARGO_PKG_VERSION`, `threads >= 1`, and the
    //   display string mentions both.
    fn fit_info_reports_version_and_threads() {
        // Act
        let info = fit_info();

        // Assert
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(info.threads >= 1);
        let shown = info.to_string();
        assert!(shown.contains(info.version));
        assert!(shown.contains(&info.threads.to_string()));
    }
}
