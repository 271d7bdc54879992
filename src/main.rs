use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use winery_site::age::SystemClock;
use winery_site::{config, output, pipeline, publish};

fn version_string() -> &'static str {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{}@{hash}", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "winery-site")]
#[command(about = "Build a winery catalog page from a spreadsheet and serve it")]
#[command(long_about = "\
Build a winery catalog page from a spreadsheet and serve it

The spreadsheet is the data source. Each row of the sheet is a product;
the first row names the columns. Products are grouped under their
category column, categories sorted by name, and the result is rendered
through a Handlebars template:

  template.html sees
    winery_age           \"104 года\"
    drinks_by_category   { \"Белые вина\": [ {\"Название\": ..., \"Цена\": ...}, ... ], ... }

Settings come from config.toml (optional), overridden by the flags below.
Run 'winery-site gen-config' to print a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (optional)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Product spreadsheet
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Sheet holding the products
    #[arg(long, global = true)]
    sheet: Option<String>,

    /// Template file name
    #[arg(long, global = true)]
    template: Option<String>,

    /// Directory the template is looked up in
    #[arg(long, global = true)]
    template_dir: Option<PathBuf>,

    /// Where the rendered page is written
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Server port
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the page, then serve the site directory (default)
    Serve,
    /// Build the page and exit
    Build,
    /// Validate the spreadsheet without rendering
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            data_path: self.data.clone(),
            sheet: self.sheet.clone(),
            template_name: self.template.clone(),
            template_dir: self.template_dir.clone(),
            output_path: self.output.clone(),
            port: self.port,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "winery_site=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let command = cli.command.as_ref().unwrap_or(&Command::Serve);
    let load_config = || config::load_config(&cli.config, cli.overrides());
    let clock = SystemClock;

    match command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Check => {
            let site_config = load_config()?;
            println!("==> Checking {}", site_config.data.path.display());
            let report = pipeline::check(&site_config, &clock)?;
            output::print_check_output(&report);
        }
        Command::Build => {
            let site_config = load_config()?;
            println!("==> Building {}", site_config.output.path.display());
            let report = pipeline::build(&site_config, &clock)?;
            output::print_build_output(&report);
        }
        Command::Serve => {
            let site_config = load_config()?;
            println!("==> Building {}", site_config.output.path.display());
            let report = pipeline::build(&site_config, &clock)?;
            output::print_build_output(&report);

            let addr = site_config.server.socket_addr()?;
            println!(
                "==> Serving {} on http://{addr}",
                site_config.server.root.display()
            );
            tokio::runtime::Runtime::new()?
                .block_on(publish::serve(addr, site_config.server.root.clone()))?;
        }
    }

    Ok(())
}
