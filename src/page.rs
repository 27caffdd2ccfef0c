// ABOUTME: Page prerendering pipeline for the folio command line tools
// ABOUTME: Reads a portfolio page, installs carousel markup and writes the result

use crate::config::Config;
use crate::dom::Document;
use crate::errors::{FolioError, Result};
use crate::factory::{self, CarouselPlan, SectionOutcome, SectionRule};
use crate::resources::{self, ResourceFile};
use crate::utils;
use crate::viewport::Breakpoints;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a prerender needs besides the page itself.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub viewport_width: u32,
    pub breakpoints: Breakpoints,
    pub rules: Vec<SectionRule>,
    pub css_files: Vec<ResourceFile>,
    pub js_files: Vec<ResourceFile>,
    pub embed_resources: bool,
}

impl PageOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            viewport_width: config.viewport_width,
            breakpoints: config.breakpoints(),
            rules: config.section_rules()?,
            css_files: Vec::new(),
            js_files: Vec::new(),
            embed_resources: config.embed_resources,
        })
    }
}

/// What a prerender changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    pub plans: Vec<CarouselPlan>,
    pub outcomes: Vec<SectionOutcome>,
    pub resources: usize,
}

/// Prerender markup held in memory.
pub fn prerender(html: &str, options: &PageOptions) -> Result<(String, PageReport)> {
    let mut doc = Document::parse(html)?;
    let (plans, outcomes) = factory::transform_page(
        &mut doc,
        &options.rules,
        options.viewport_width,
        &options.breakpoints,
    )?;

    let mut injected = resources::inject(&mut doc, &options.css_files, options.embed_resources)?;
    injected += resources::inject(&mut doc, &options.js_files, options.embed_resources)?;

    Ok((
        doc.to_html(),
        PageReport {
            plans,
            outcomes,
            resources: injected,
        },
    ))
}

/// Prerender a page file.
pub fn prerender_file(input: &Path, options: &PageOptions) -> Result<(String, PageReport)> {
    info!("Prerendering page: {:?}", input);
    utils::validate_file_exists(input)?;
    let html = fs::read_to_string(input)?;
    let (output, report) = prerender(&html, options)?;
    info!(
        "Installed {} carousel(s) at {}px",
        report.plans.len(),
        options.viewport_width
    );
    Ok((output, report))
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);
    utils::ensure_parent_directory_exists(output_path)?;
    fs::write(output_path, html_content)?;
    Ok(())
}

/// Prerender every page matching `pattern` into `out_dir`, keeping file names.
pub fn prerender_batch(
    pattern: &str,
    out_dir: &Path,
    options: &PageOptions,
) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|e| FolioError::ValidationError(format!("Invalid glob pattern: {}", e)))?;
    let inputs: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
    if inputs.is_empty() {
        return Err(FolioError::NoPagesFoundError(pattern.to_string()));
    }

    utils::validate_directory_writable(out_dir)?;
    let mut written = Vec::with_capacity(inputs.len());
    for input in inputs {
        let Some(name) = input.file_name() else {
            continue;
        };
        let (html, _) = prerender_file(&input, options)?;
        let output = out_dir.join(name);
        write_html_to_file(&html, &output)?;
        written.push(output);
    }
    Ok(written)
}
