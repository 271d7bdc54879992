//! # Winery Site
//!
//! Builds the product catalog page of a winery website from a spreadsheet and
//! serves it as a static site. The spreadsheet is the data source: one row per
//! product, one column naming its category, any other columns the template
//! wants to show.
//!
//! # Pipeline
//!
//! ```text
//! 1. Load      wine3.xlsx / Лист1  →  Vec<ProductRecord>
//! 2. Group     records              →  GroupedCatalog   (sorted by category)
//! 3. Age       1920 + clock         →  "104 года"
//! 4. Render    template.html        →  page HTML
//! 5. Publish   index.html           →  static file server on :8000
//! ```
//!
//! Steps 1–4 are pure transformations apart from reading their inputs; the
//! page is written only once all of them have succeeded.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`records`] | Spreadsheet sheet → ordered product records |
//! | [`catalog`] | Stable grouping of records by category, sorted by key |
//! | [`age`] | Years since foundation with the agreeing Russian noun form |
//! | [`render`] | Handlebars page template with auto-escaping |
//! | [`publish`] | Atomic page write and the static file server |
//! | [`pipeline`] | Wires the steps together: `build` and `check` |
//! | [`config`] | `config.toml` + CLI flag layering and validation |
//! | [`output`] | CLI summaries of build results |
//!
//! # Design Decisions
//!
//! ## Runtime Templates
//!
//! The page layout is owned by whoever maintains the website, so it stays in
//! an editable `template.html` rendered with Handlebars rather than being
//! compiled into the binary. HTML the binary owns itself (directory listings)
//! is written with Maud.
//!
//! ## Records as Ordered Maps
//!
//! Spreadsheet columns change whenever the wine list does. Only the category
//! column has meaning to the build; every other column is passed through to
//! the template by name, in sheet order.
//!
//! ## Injected Clock
//!
//! The "years in business" phrase depends on the current year. It is read
//! through the [`age::Clock`] trait so tests pin the year and builds can be
//! compared byte for byte.

pub mod age;
pub mod catalog;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod records;
pub mod render;
