//! Conversion pipeline.
//!
//! The [`Converter`] owns the URI and action caches, the external reference
//! resolver, and the diagnostic report for a run. Documents are processed
//! strictly one at a time: route and action metadata are extracted first,
//! then the document is rewritten in place. After the last document the
//! merge pass attaches actions to their resource paths and the service
//! document is synthesized from the finished cache.

use std::path::Path;

use serde_json::Value;

use crate::base;
use crate::config::Config;
use crate::indexer::{self, ActionCache, UriCache};
use crate::loader;
use crate::report::ConversionReport;
use crate::resolver::Resolver;
use crate::rewriter;
use crate::service_doc;

/// Drives the conversion of a set of schema documents.
pub struct Converter {
    config: Config,
    uri_cache: UriCache,
    action_cache: ActionCache,
    resolver: Resolver,
    report: ConversionReport,
}

/// The outcome of a finished run.
pub struct Conversion {
    /// The synthesized top-level routing document.
    pub service_document: Value,
    pub report: ConversionReport,
}

impl Converter {
    /// Create a converter for documents living in `input_dir`.
    ///
    /// The input directory is consulted when classifying cross-document
    /// references before falling back to a network fetch.
    pub fn new(config: Config, input_dir: &Path) -> Self {
        let resolver = Resolver::new(input_dir, config.odata_schema.clone());
        Converter {
            config,
            uri_cache: UriCache::new(),
            action_cache: ActionCache::new(),
            resolver,
            report: ConversionReport::new(),
        }
    }

    /// Seed the caches from a previously generated service document.
    ///
    /// Call before converting any documents; new input layers on top of the
    /// seeded entries. An unreadable base is reported and ignored.
    pub fn load_base(&mut self, path: &Path) {
        base::load_base_document(
            path,
            &mut self.uri_cache,
            &mut self.action_cache,
            &self.config.extensions,
            &mut self.report,
        );
    }

    /// Index and rewrite one parsed document, returning its converted form.
    ///
    /// `filename` is the document's input file name; it keys the action
    /// cache and appears in diagnostics.
    pub fn convert_document(&mut self, filename: &str, mut document: Value) -> Value {
        indexer::scan_uri_info(&document, filename, &mut self.uri_cache, &mut self.report);
        indexer::scan_actions(&mut document, filename, &mut self.action_cache, &mut self.report);
        rewriter::rewrite_document(&mut document, &mut self.resolver, &mut self.report, filename);
        self.report.files_processed += 1;
        document
    }

    /// Load and convert one input file.
    ///
    /// A document that fails to parse is reported and skipped; `None` means
    /// nothing should be written for it.
    pub fn convert_file(&mut self, path: &Path) -> Option<Value> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        match loader::load_document(path) {
            Ok(document) => Some(self.convert_document(&filename, document)),
            Err(err) => {
                self.report.files_skipped += 1;
                self.report
                    .error("E001", filename, "", format!("skipping document: {}", err));
                None
            }
        }
    }

    /// Diagnostics collected so far.
    pub fn report(&self) -> &ConversionReport {
        &self.report
    }

    /// The routable paths indexed so far (read-only).
    pub fn uri_cache(&self) -> &UriCache {
        &self.uri_cache
    }

    /// Run the merge pass and synthesize the service document.
    pub fn finish(mut self) -> Conversion {
        indexer::merge_actions(&mut self.uri_cache, &self.action_cache);
        let service_document =
            service_doc::build_service_document(&self.uri_cache, &self.config, &mut self.report);
        Conversion {
            service_document,
            report: self.report,
        }
    }
}
