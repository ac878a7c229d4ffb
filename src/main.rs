use apicli::app::{App, AppConfig};
use apicli::catalog::Catalog;
use apicli::{config, exit_codes};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main entry point for the program
#[tokio::main]
async fn main() {
    // Intialize the logging subsystem
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Locate and load the API catalog
    let catalog_path = match std::env::var("APICLI_CATALOG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => match config::default_catalog_path() {
            Some(path) => path,
            None => {
                eprintln!("ERROR: cannot resolve the default catalog location");
                ::std::process::exit(exitcode::CONFIG);
            }
        },
    };
    let catalog = match Catalog::load(&catalog_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ::std::process::exit(exitcode::CONFIG);
        }
    };

    let settings = AppConfig::builder()
        .app_name("apicli Client")
        .app_bin("apicli")
        .app_version(env!("CARGO_PKG_VERSION"))
        .build();
    let app = App::new(catalog, settings);

    // Run one invocation and map its terminal state to an exit code
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let result = app.run(&argv).await;
    if let Err(e) = &result {
        eprintln!("ERROR: {}", e);
    }
    ::std::process::exit(exit_codes::for_result(&result).code());
}
