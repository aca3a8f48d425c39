//! Sieve configuration: paths to the six on-disk artifacts of spec section 6,
//! the output CSV path, and the worker thread count.
//!
//! Loaded the way `zksync_config`'s `*Options::from_env()` functions are:
//! read from environment variables with documented defaults. CLI flags (see
//! `core/bin/sieve`) are applied afterwards and override whatever the
//! environment supplied.

use std::path::{Path, PathBuf};

use crate::error::{IoError, IoResult};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_usize(name: &str, default: usize) -> IoResult<usize> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(v) => v
            .parse()
            .map_err(|_| IoError::BadEnvNumber(name.to_string())),
    }
}

/// Paths to the six artifacts spec section 6 names, plus where to write
/// results and how many worker threads to use.
#[derive(Debug, Clone)]
pub struct SieveConfig {
    pub h_path: PathBuf,
    pub gt_path: PathBuf,
    pub zs_path: PathBuf,
    pub clock_patterns_path: PathBuf,
    pub ciphertext_path: PathBuf,
    pub s_path: PathBuf,
    pub output_csv: PathBuf,
    pub threads: usize,
    pub log_format: vlog::LogFormat,
}

impl SieveConfig {
    /// Reads `SIEVE_DATA_DIR` (default `data`), `SIEVE_OUTPUT_CSV` (default
    /// `sieve_results.csv`), `SIEVE_THREADS` (default: all available cores),
    /// and `SIEVE_LOG_FORMAT` (default `plain`). Artifact file names within
    /// the data directory follow spec section 6's names verbatim.
    pub fn from_env() -> IoResult<Self> {
        let data_dir = PathBuf::from(env_or("SIEVE_DATA_DIR", "data"));
        let threads = env_usize("SIEVE_THREADS", num_cpus())?;
        let log_format = env_or("SIEVE_LOG_FORMAT", "plain")
            .parse()
            .unwrap_or(vlog::LogFormat::Plain);

        Ok(SieveConfig {
            h_path: data_dir.join("H.bin"),
            gt_path: data_dir.join("Gt.bin"),
            zs_path: data_dir.join("zS.bin"),
            clock_patterns_path: data_dir.join("r4_clock_patterns.bin"),
            ciphertext_path: data_dir.join("ciphertext.bin"),
            s_path: data_dir.join("s.bin"),
            output_csv: PathBuf::from(env_or("SIEVE_OUTPUT_CSV", "sieve_results.csv")),
            threads,
            log_format,
        })
    }

    /// Overrides the data directory (and every artifact path derived from
    /// it), keeping file names fixed. Used when a CLI flag supersedes the
    /// environment default.
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.h_path = dir.join("H.bin");
        self.gt_path = dir.join("Gt.bin");
        self.zs_path = dir.join("zS.bin");
        self.clock_patterns_path = dir.join("r4_clock_patterns.bin");
        self.ciphertext_path = dir.join("ciphertext.bin");
        self.s_path = dir.join("s.bin");
        self
    }

    pub fn with_output_csv(mut self, path: impl AsRef<Path>) -> Self {
        self.output_csv = path.as_ref().to_path_buf();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_well_formed() {
        std::env::remove_var("SIEVE_DATA_DIR");
        std::env::remove_var("SIEVE_THREADS");
        std::env::remove_var("SIEVE_LOG_FORMAT");
        let cfg = SieveConfig::from_env().unwrap();
        assert_eq!(cfg.h_path, PathBuf::from("data/H.bin"));
        assert_eq!(cfg.output_csv, PathBuf::from("sieve_results.csv"));
        assert!(cfg.threads >= 1);
    }

    #[test]
    fn with_data_dir_rewrites_artifact_paths() {
        let cfg = SieveConfig::from_env().unwrap().with_data_dir("/tmp/fixtures");
        assert_eq!(cfg.h_path, PathBuf::from("/tmp/fixtures/H.bin"));
        assert_eq!(cfg.s_path, PathBuf::from("/tmp/fixtures/s.bin"));
    }

    #[test]
    fn bad_thread_count_is_rejected() {
        std::env::set_var("SIEVE_THREADS", "not-a-number");
        let result = SieveConfig::from_env();
        std::env::remove_var("SIEVE_THREADS");
        assert!(result.is_err());
    }
}
