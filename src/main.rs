//! swagger-lite - Command-line tool for generating Swagger documentation.
//!
//! Controllers are documented with `@`-tags in their `///` comments, and the
//! API-wide metadata lives in the `//!` docs of the package's root file. The
//! tool walks the API package and everything it reaches, then prints a
//! resource listing with one API declaration per resource.
//!
//! # Usage
//!
//! ```bash
//! swagger-lite --api-package <PKG> [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Generate JSON documentation for `src/api`:
//! ```bash
//! swagger-lite --search-root src --api-package api -o swagger.json
//! ```
//!
//! Generate markdown, tolerating a package that may be absent:
//! ```bash
//! swagger-lite --api-package api --exclude legacy -f markdown -o API.md
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! swagger-lite --api-package api -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_lite::cli;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("swagger-lite starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Documentation generation completed successfully");

    Ok(())
}
