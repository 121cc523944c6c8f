#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use log::{info, error, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use std::{env, fs, path::Path, sync::Arc};
use lazy_static::lazy_static;
use structopt::StructOpt;

// Oracle Utilities
use crate::utils::{errors::Errors, response_store::ResponseStore};
use crate::utils::oracle_utils::get_absolute_path;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Directory and file locations. Unless otherwise noted, all files and directories
// are relative to the root directory.
const ENV_ORACLE_ROOT_DIR  : &str = "ORACLE_ROOT_DIR";
const DEFAULT_ROOT_DIR     : &str = "~/.pixel_oracle";
const CONFIG_DIR           : &str = "/config";
const LOG4RS_CONFIG_FILE   : &str = "/log4rs.yml";     // relative to config dir
const ORACLE_CONFIG_FILE   : &str = "/oracle.toml";    // relative to config dir
const RESPONSES_FILE       : &str = "/responses.json"; // relative to config dir

// Networking.
const DEFAULT_HTTP_ADDR    : &str = "http://localhost";
const DEFAULT_HTTP_PORT    : u16  = 5000;

const DEFAULT_TITLE        : &str = "Pixel Oracle";

// Console logging used when no log4rs file is installed.
const DEFAULT_LOG_PATTERN  : &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE the runtime context is built in main.
lazy_static! {
    pub static ref ORACLE_ARGS: OracleArgs = init_oracle_args();
}

// Calculate the data directories BEFORE the runtime context is built in main.
lazy_static! {
    pub static ref ORACLE_DIRS: OracleDirs = init_oracle_dirs();
}

// ***************************************************************************
//                             Directory Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// OracleDirs:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct OracleDirs {
    pub root_dir: String,
    pub config_dir: String,
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// OracleArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "oracle_args", about = "Command line arguments for the Pixel Oracle server.")]
pub struct OracleArgs {
    /// Specify the oracle's root data directory.
    ///
    /// The root directory is calculated using the following priority order:
    ///
    ///   1. If set, the value of the ORACLE_ROOT_DIR environment variable,
    ///
    ///   2. Otherwise, if set, the value of the --root-dir command line argument,
    ///
    ///   3. Otherwise, ~/.pixel_oracle
    ///
    #[structopt(short, long)]
    pub root_dir: Option<String>,

    /// Path of the JSON file mapping categories to answers.
    ///
    /// Overrides the responses_file setting in oracle.toml.  When neither is
    /// set, config/responses.json under the root directory is used.
    #[structopt(short = "f", long)]
    pub responses_file: Option<String>,

    /// Load and validate the configuration and responses, then exit.
    #[structopt(short, long)]
    pub check_config: bool,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
/** Everything the server needs, assembled once at startup.  The store is
 * handed to the request handlers explicitly.
 */
#[derive(Debug)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub responses_file: String,
    pub store: Arc<ResponseStore>,
    pub oracle_args: &'static OracleArgs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
    pub responses_file: Option<String>,
    pub random_seed: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            responses_file: None,
            random_seed: None,
        }
    }
}

// ***************************************************************************
//                            Directory Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_oracle_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_oracle_args() -> OracleArgs {
    let args = OracleArgs::from_args();
    println!("{:?}", args);
    args
}

// ---------------------------------------------------------------------------
// init_oracle_dirs:
// ---------------------------------------------------------------------------
/** Calculate the external data directories.  Nothing is created here; the
 * configuration files are optional and log4rs creates its own log files.
 */
fn init_oracle_dirs() -> OracleDirs {
    let env_root = env::var(ENV_ORACLE_ROOT_DIR).ok();
    make_oracle_dirs(&get_root_dir(env_root, ORACLE_ARGS.root_dir.clone()))
}

// ---------------------------------------------------------------------------
// make_oracle_dirs:
// ---------------------------------------------------------------------------
fn make_oracle_dirs(root_dir: &str) -> OracleDirs {
    let root_dir = root_dir.to_string();
    let config_dir = root_dir.clone() + CONFIG_DIR;
    OracleDirs {root_dir, config_dir}
}

// ---------------------------------------------------------------------------
// get_root_dir:
// ---------------------------------------------------------------------------
fn get_root_dir(env_root: Option<String>, arg_root: Option<String>) -> String {
    // Order of precedence:
    //  1. Environment variable
    //  2. Command line --root-dir argument
    //  3. Default location
    //
    let root_dir = env_root
        .or(arg_root)
        .unwrap_or_else(|| DEFAULT_ROOT_DIR.to_string());

    // Canonicalize the path.
    get_absolute_path(&root_dir)
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs from the installed configuration file, or fall back to
 * console logging at info level when there isn't one.
 */
pub fn init_log() -> Result<()> {
    let logconfig = init_log_config();
    if Path::new(&logconfig).is_file() {
        if let Err(e) = log4rs::init_file(&logconfig, Default::default()) {
            return Err(anyhow!(Errors::Log4rsInitialization(logconfig, e.to_string())));
        }
        info!("Log4rs initialized using: {}", logconfig);
    } else {
        init_console_log()?;
        info!("Log4rs configuration {} not found, logging to console.", logconfig);
    }
    info!("Using oracle root directory: {}", ORACLE_DIRS.root_dir);
    Ok(())
}

// ---------------------------------------------------------------------------
// init_log_config:
// ---------------------------------------------------------------------------
fn init_log_config() -> String {
    ORACLE_DIRS.config_dir.clone() + LOG4RS_CONFIG_FILE
}

// ---------------------------------------------------------------------------
// init_console_log:
// ---------------------------------------------------------------------------
fn init_console_log() -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))
        .map_err(|e| Errors::Log4rsInitialization("console".to_string(), e.to_string()))?;
    log4rs::init_config(config)
        .map_err(|e| Errors::Log4rsInitialization("console".to_string(), e.to_string()))?;
    Ok(())
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file in the
 * config directory.
 */
fn get_parms() -> Result<Parms> {
    let config_file = ORACLE_DIRS.config_dir.clone() + ORACLE_CONFIG_FILE;
    get_parms_from(&config_file)
}

// ---------------------------------------------------------------------------
// get_parms_from:
// ---------------------------------------------------------------------------
/** Read the TOML configuration file.  A missing or unreadable file means all
 * defaults are used; a file that doesn't parse is an error.
 */
fn get_parms_from(config_file: &str) -> Result<Parms> {
    // Read the cofiguration file.
    let config_file_abs = get_absolute_path(config_file);
    info!("{}", Errors::ReadingConfigFile(config_file_abs.clone()));
    let contents = match fs::read_to_string(&config_file_abs) {
        Ok(c) => c,
        Err(_) => {
            info!("Unable to read configuration at {}. Using default values.", config_file_abs);
            return Ok(Parms { config_file: Default::default(), config: Config::new() });
        }
    };

    // Parse the toml configuration.
    let config : Config = match toml::from_str(&contents) {
        Ok(c)  => c,
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file_abs), e);
            error!("{}", msg);
            return Result::Err(anyhow!(msg));
        }
    };

    Ok(Parms { config_file: config_file_abs, config })
}

// ---------------------------------------------------------------------------
// resolve_responses_file:
// ---------------------------------------------------------------------------
/** The command line wins over the configuration file, which wins over the
 * default location in the config directory.
 */
fn resolve_responses_file(arg_file: Option<&str>, config: &Config, config_dir: &str) -> String {
    let file = match arg_file.or(config.responses_file.as_deref()) {
        Some(f) => f.to_string(),
        None => config_dir.to_string() + RESPONSES_FILE,
    };
    get_absolute_path(&file)
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
/** Read the parameters and load the responses.  Either failing aborts startup. */
pub fn init_runtime_context() -> Result<RuntimeCtx> {
    let parms = get_parms()?;
    let responses_file = resolve_responses_file(
        ORACLE_ARGS.responses_file.as_deref(), &parms.config, &ORACLE_DIRS.config_dir);
    let store = ResponseStore::load(&responses_file)?;
    info!("Loaded {} categories from {}.", store.len(), responses_file);

    Ok(RuntimeCtx {
        parms,
        responses_file,
        store: Arc::new(store),
        oracle_args: &ORACLE_ARGS,
    })
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str) -> String {
        format!("{}/resources/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn print_config() {
        println!("{:?}", Config::new());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str("http_port = 8080\nrandom_seed = 3\n").unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.random_seed, Some(3));
        assert_eq!(config.title, DEFAULT_TITLE);
        assert_eq!(config.http_addr, DEFAULT_HTTP_ADDR);
        assert!(config.responses_file.is_none());
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let parms = get_parms_from("/nonexistent/pixel_oracle/oracle.toml").unwrap();
        assert_eq!(parms.config, Config::default());
        assert!(parms.config_file.is_empty());
    }

    #[test]
    fn sample_config_file_parses() {
        let parms = get_parms_from(&resource("oracle.toml")).unwrap();
        assert_eq!(parms.config.title, DEFAULT_TITLE);
        assert_eq!(parms.config.http_port, DEFAULT_HTTP_PORT);
        assert!(parms.config_file.ends_with("resources/oracle.toml"));
    }

    #[test]
    fn bad_toml_is_error() {
        // The build script is not TOML.
        let path = format!("{}/build.rs", env!("CARGO_MANIFEST_DIR"));
        assert!(get_parms_from(&path).is_err());
    }

    #[test]
    fn root_dir_precedence() {
        let env_root = Some("/srv/oracle_env".to_string());
        let arg_root = Some("/srv/oracle_arg".to_string());
        assert_eq!(get_root_dir(env_root.clone(), arg_root.clone()), "/srv/oracle_env");
        assert_eq!(get_root_dir(None, arg_root), "/srv/oracle_arg");
        assert!(get_root_dir(None, None).ends_with("/.pixel_oracle"));
    }

    #[test]
    fn dirs_derived_from_root() {
        let dirs = make_oracle_dirs("/srv/oracle");
        assert_eq!(dirs.config_dir, "/srv/oracle/config");
        assert_eq!(dirs.root_dir, "/srv/oracle");
    }

    #[test]
    fn responses_file_precedence() {
        let mut config = Config::new();
        assert_eq!(resolve_responses_file(None, &config, "/srv/oracle/config"),
                   "/srv/oracle/config/responses.json");

        config.responses_file = Some("/data/config_responses.json".to_string());
        assert_eq!(resolve_responses_file(None, &config, "/srv/oracle/config"),
                   "/data/config_responses.json");
        assert_eq!(resolve_responses_file(Some("/data/arg_responses.json"), &config, "/srv/oracle/config"),
                   "/data/arg_responses.json");
    }
}
