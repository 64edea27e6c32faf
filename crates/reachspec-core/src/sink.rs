// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Destinations for best-so-far tests.
//!
//! **DDD Context:** Fitness

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Receives a test whenever it improves on the best fitness or fully covers
/// the goal.
pub trait OutputSink {
    /// Records `test`, which reached `fitness`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the test cannot be written.
    fn write_test(&mut self, test: &str, fitness: f64) -> io::Result<()>;
}

/// Keeps the latest test in a file, replacing earlier contents.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for FileSink {
    fn write_test(&mut self, test: &str, fitness: f64) -> io::Result<()> {
        fs::write(&self.path, format!("// fitness: {fitness}\n{test}\n"))
    }
}

/// Collects tests in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub entries: Vec<(String, f64)>,
}

impl OutputSink for MemorySink {
    fn write_test(&mut self, test: &str, fitness: f64) -> io::Result<()> {
        self.entries.push((test.to_string(), fitness));
        Ok(())
    }
}
