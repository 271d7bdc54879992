//! The build: spreadsheet in, catalog page out.
//!
//! ```text
//! records::load_records → catalog::group_by_category ─┐
//! age::winery_age ────────────────────────────────────┤→ render → publish::write_page
//! ```
//!
//! Every step that can fail runs before the output file is touched, so a
//! failed build leaves the previous page (or no page) in place.

use crate::age::{self, Clock, WineryAge};
use crate::catalog::{self, GroupedCatalog, MissingFieldError};
use crate::config::SiteConfig;
use crate::records::{self, DataSourceError};
use crate::render::{PageContext, PageRenderer, TemplateError};
use crate::publish;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
    #[error(transparent)]
    MissingField(#[from] MissingFieldError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a build produced.
#[derive(Debug)]
pub struct BuildReport {
    pub catalog: GroupedCatalog,
    pub winery_age: WineryAge,
    pub output: PathBuf,
    pub bytes_written: usize,
}

/// Load and group the product data and compute the winery age.
///
/// This is everything except rendering and writing; `check` stops here.
pub fn prepare(
    config: &SiteConfig,
    clock: &impl Clock,
) -> Result<(GroupedCatalog, WineryAge), BuildError> {
    let records = records::load_records(
        &config.data.path,
        &config.data.sheet,
        &config.data.load_options(),
    )?;
    let catalog = catalog::group_by_category(records, &config.data.category_column)?;
    let winery_age = age::winery_age(config.foundation_year, clock);
    Ok((catalog, winery_age))
}

/// Validate the data without rendering or writing anything.
pub fn check(config: &SiteConfig, clock: &impl Clock) -> Result<BuildReport, BuildError> {
    let (catalog, winery_age) = prepare(config, clock)?;
    Ok(BuildReport {
        catalog,
        winery_age,
        output: config.output.path.clone(),
        bytes_written: 0,
    })
}

/// Run the full build and write the page.
pub fn build(config: &SiteConfig, clock: &impl Clock) -> Result<BuildReport, BuildError> {
    let (catalog, winery_age) = prepare(config, clock)?;

    let renderer = PageRenderer::from_file(
        &config.template.dir,
        &config.template.name,
        &config.template.options(),
    )?;
    let page = renderer.render(&PageContext {
        winery_age: winery_age.to_string(),
        drinks_by_category: &catalog,
    })?;

    let output = config.output.path.clone();
    publish::write_page(&output, &page).map_err(|source| BuildError::Write {
        path: output.clone(),
        source,
    })?;
    tracing::info!(
        output = %output.display(),
        bytes = page.len(),
        products = catalog.len(),
        "page written"
    );

    Ok(BuildReport {
        catalog,
        winery_age,
        output,
        bytes_written: page.len(),
    })
}
