//! Application driver.
//!
//! Owns the loaded catalog and the construction-time settings, and drives
//! one invocation through resolve → (help | prompt → dispatch). Settings
//! are assembled once, defaults first and caller overrides second; nothing
//! is injected into a live application afterwards.

use crate::argparse::Shortcuts;
use crate::catalog::{Catalog, CatalogError};
use crate::config;
use crate::help;
use crate::param::{InputMode, ParamDef};
use crate::prompt::{self, InquirePrompter, PromptError, Prompter};
use crate::request::{self, DispatchError, LogResponseHandler, RequestOutcome, ResponseHandler};
use crate::resolve::{HelpTopic, Resolution, ResolveError, Resolver};
use std::path::PathBuf;
use tracing::{debug, error};

/// Errors `App::run` does not resolve into a help view: the user-facing
/// flow already failed past the resolution phase.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Terminal state of one invocation. The binary maps these to process exit
/// codes; embedders may map them differently.
#[derive(Debug)]
pub enum RunState {
    HelpDisplayed,
    /// A resolution failure was reported and redirected into help output.
    ResolutionFailed,
    Dispatched(RequestOutcome),
}

/// The canonical static flag set merged into every task's schema.
pub fn default_static_params() -> Vec<ParamDef> {
    vec![
        ParamDef::new("help", "boolean", "Show help"),
        ParamDef::new("config", "string", "Configuration file"),
        ParamDef::new("username", "string", "User name").with_input(InputMode::Text),
        ParamDef::new("password", "string", "User password").with_input(InputMode::Hidden),
        ParamDef::new("host", "string", "API instance ID or host URL"),
        ParamDef::new("file", "string", "Output filename"),
    ]
}

pub fn default_shortcuts() -> Shortcuts {
    [
        ('c', "config".to_string()),
        ('h', "help".to_string()),
        ('f', "file".to_string()),
    ]
    .into_iter()
    .collect()
}

/// Immutable application settings, built once at construction time.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_name: String,
    pub app_bin: String,
    pub app_version: String,
    /// Overrides the generated usage line in the help header.
    pub usage: Option<String>,
    /// Pins the API class, so the first positional is already the task.
    pub fixed_class: Option<String>,
    /// Config file consulted when no `--config` was given; `None` disables
    /// the default lookup entirely.
    pub default_config: Option<PathBuf>,
    pub static_params: Vec<ParamDef>,
    pub shortcuts: Shortcuts,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            app_name: "apicli Client".to_string(),
            app_bin: "apicli".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            usage: None,
            fixed_class: None,
            default_config: config::default_config_path(),
            static_params: default_static_params(),
            shortcuts: default_shortcuts(),
        }
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: AppConfig::default(),
        }
    }
}

/// Overlays caller overrides onto the defaults.
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn app_name(mut self, name: &str) -> Self {
        self.config.app_name = name.to_string();
        self
    }

    pub fn app_bin(mut self, bin: &str) -> Self {
        self.config.app_bin = bin.to_string();
        self
    }

    pub fn app_version(mut self, version: &str) -> Self {
        self.config.app_version = version.to_string();
        self
    }

    pub fn usage(mut self, usage: &str) -> Self {
        self.config.usage = Some(usage.to_string());
        self
    }

    pub fn fixed_class(mut self, class: &str) -> Self {
        self.config.fixed_class = Some(class.to_string());
        self
    }

    pub fn default_config(mut self, path: PathBuf) -> Self {
        self.config.default_config = Some(path);
        self
    }

    pub fn without_default_config(mut self) -> Self {
        self.config.default_config = None;
        self
    }

    /// Append caller-supplied parameters to the static flag set.
    pub fn extend_static_params(mut self, params: Vec<ParamDef>) -> Self {
        self.config.static_params.extend(params);
        self
    }

    pub fn shortcut(mut self, short: char, target: &str) -> Self {
        self.config.shortcuts.insert(short, target.to_string());
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

pub struct App {
    catalog: Catalog,
    config: AppConfig,
    handler: Box<dyn ResponseHandler>,
    client: reqwest::Client,
}

impl App {
    pub fn new(catalog: Catalog, config: AppConfig) -> App {
        App {
            catalog,
            config,
            handler: Box::new(LogResponseHandler),
            client: reqwest::Client::new(),
        }
    }

    /// Replace the default response handler.
    pub fn with_handler(mut self, handler: Box<dyn ResponseHandler>) -> App {
        self.handler = handler;
        self
    }

    /// Run one invocation against the given process arguments (without the
    /// binary name).
    pub async fn run(&self, argv: &[String]) -> Result<RunState, CliError> {
        self.run_with_prompter(argv, &mut InquirePrompter).await
    }

    pub async fn run_with_prompter(
        &self,
        argv: &[String],
        prompter: &mut dyn Prompter,
    ) -> Result<RunState, CliError> {
        let resolver = Resolver::new(&self.catalog, &self.config);

        match resolver.resolve(argv) {
            Ok(Resolution::Help(topic)) => {
                println!("{}", help::render(&self.catalog, &self.config, &topic));
                Ok(RunState::HelpDisplayed)
            }
            Ok(Resolution::Ready(mut invocation)) => {
                prompt::fill_interactive(&mut invocation.options, &invocation.interactive, prompter)?;

                debug!(
                    "Dispatching {} -> {} with {} option(s)",
                    invocation.class,
                    invocation.task.cmd,
                    invocation.options.len()
                );
                let outcome = request::dispatch(
                    &self.client,
                    &self.catalog.url,
                    &invocation,
                    self.handler.as_ref(),
                )
                .await?;
                Ok(RunState::Dispatched(outcome))
            }
            Err(ResolveError::MissingParameters(params)) => {
                error!("Aborting: required parameters are missing");
                println!(
                    "{}",
                    help::render_param_list("The following parameters are missing", &params)
                );
                println!("Type --help to see more details");
                Ok(RunState::ResolutionFailed)
            }
            Err(e) => {
                error!("Failed to initialize options - {}", e);
                println!("Failed to initialize options - {}", e);
                println!();
                let topic = help_topic_for(&e);
                println!("{}", help::render(&self.catalog, &self.config, &topic));
                Ok(RunState::ResolutionFailed)
            }
        }
    }
}

/// Pick the most specific help view the failed resolution still allows.
fn help_topic_for(error: &ResolveError) -> HelpTopic {
    match error {
        ResolveError::Catalog(CatalogError::UnknownClass { class }) => HelpTopic {
            class: Some(class.clone()),
            task: None,
        },
        ResolveError::Catalog(CatalogError::UnknownTask { class, task }) => HelpTopic {
            class: Some(class.clone()),
            task: Some(task.clone()),
        },
        _ => HelpTopic {
            class: None,
            task: None,
        },
    }
}
