//! Single compile pass: read, extract, minify, prefix, write.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::extract::extract_region;
use crate::app::minify::{JsMin, Minifier};
use crate::domain::errors::CompileError;
use crate::domain::model::{Bookmarklet, Markers};
use crate::infra::config::Config;
use crate::infra::logging::Reporter;

/// Files and delimiters for a compile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub markers: Markers,
}

impl CompileOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            markers: Markers::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            input: config.paths.input(),
            output: config.paths.output(),
            markers: config.markers.markers(),
        }
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }
}

/// Turns the marked region of the input file into a bookmarklet file.
pub struct Compiler<M = JsMin> {
    options: CompileOptions,
    reporter: Reporter,
    minifier: M,
}

impl Compiler {
    pub fn new(options: CompileOptions, reporter: Reporter) -> Self {
        Self::with_minifier(options, reporter, JsMin)
    }
}

impl<M: Minifier> Compiler<M> {
    pub fn with_minifier(options: CompileOptions, reporter: Reporter, minifier: M) -> Self {
        Self {
            options,
            reporter,
            minifier,
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn input(&self) -> &Path {
        &self.options.input
    }

    /// Run a full pass against the configured files, overwriting the output.
    pub fn compile(&self) -> Result<Bookmarklet> {
        let input = &self.options.input;
        self.reporter
            .detail(format_args!("Reading {}", input.display()));
        let source = fs::read_to_string(input)
            .with_context(|| format!("failed to read input file {}", input.display()))?;

        let bookmarklet = self
            .compile_source(&source)
            .with_context(|| format!("failed to compile {}", input.display()))?;

        let output = &self.options.output;
        self.reporter
            .detail(format_args!("Writing {}", output.display()));
        fs::write(output, bookmarklet.as_str())
            .with_context(|| format!("failed to write output file {}", output.display()))?;

        Ok(bookmarklet)
    }

    /// Compile already loaded source text without touching the filesystem.
    pub fn compile_source(&self, source: &str) -> Result<Bookmarklet, CompileError> {
        self.reporter.detail(format_args!("Extracting marked region"));
        let region = extract_region(source, &self.options.markers)?;

        self.reporter.detail(format_args!("Minifying {} bytes", region.len()));
        let minified = self.minifier.minify(region)?;
        let bookmarklet = Bookmarklet::from_minified(&minified);

        if !bookmarklet.is_single_line() {
            self.reporter.warn(format_args!(
                "bookmarklet spans {} lines",
                bookmarklet.line_count()
            ));
        }

        Ok(bookmarklet)
    }
}
