//! Page rendering with a user-supplied Handlebars template.
//!
//! The page layout belongs to the site owner, not to this binary, so it lives
//! in an editable template file (`template.html` by default) and is rendered
//! at runtime. The template sees two bindings:
//!
//! | Binding | Value |
//! |---------|-------|
//! | `winery_age` | `"104 года"` |
//! | `drinks_by_category` | object: category → array of record objects |
//!
//! ```handlebars
//! <p>Уже {{winery_age}} с вами</p>
//! {{#each drinks_by_category}}
//!   <h2>{{@key}}</h2>
//!   {{#each this}}
//!     <div>{{[Название]}}: {{[Цена]}} р.</div>
//!   {{/each}}
//! {{/each}}
//! ```
//!
//! Double-stash interpolation (`{{...}}`) is HTML-escaped, so spreadsheet
//! text cannot inject markup. Triple-stash (`{{{...}}}`) is left to the
//! template author's judgement.

use crate::catalog::GroupedCatalog;
use handlebars::Handlebars;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid template '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },
    #[error("cannot render template '{name}': {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// Engine settings that come from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Fail on references to variables the context does not have.
    pub strict: bool,
}

/// Everything the template can see.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    pub winery_age: String,
    pub drinks_by_category: &'a GroupedCatalog,
}

/// A compiled page template.
pub struct PageRenderer {
    registry: Handlebars<'static>,
    name: String,
}

impl PageRenderer {
    /// Load template `name` from directory `dir`.
    pub fn from_file(
        dir: &Path,
        name: &str,
        options: &TemplateOptions,
    ) -> Result<Self, TemplateError> {
        let path = dir.join(name);
        let source = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                TemplateError::NotFound(path.clone())
            } else {
                TemplateError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        tracing::debug!(path = %path.display(), "loaded template");
        Self::from_source(name, &source, options)
    }

    /// Compile a template held in memory.
    pub fn from_source(
        name: &str,
        source: &str,
        options: &TemplateOptions,
    ) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(options.strict);
        registry
            .register_template_string(name, source)
            .map_err(|source| TemplateError::Parse {
                name: name.to_string(),
                source: Box::new(source),
            })?;
        Ok(Self {
            registry,
            name: name.to_string(),
        })
    }

    pub fn render(&self, context: &PageContext<'_>) -> Result<String, TemplateError> {
        self.registry
            .render(&self.name, context)
            .map_err(|source| TemplateError::Render {
                name: self.name.clone(),
                source: Box::new(source),
            })
    }
}
