//! keygen CLI application.
//!
//! Generates a self-signed certificate and private key for local TLS
//! testing. Long flags may be written with one dash (`-hosts=a,b`) or two.

use clap::{ArgAction, CommandFactory, Parser};
use keygen::config::{
    format_duration, parse_duration, GeneratorConfig, KeyPathPolicy, DEFAULT_BITS,
    DEFAULT_CERT_PATH, DEFAULT_EXPIRATION, DEFAULT_HOSTS, DEFAULT_KEY_PATH, DEFAULT_ORGANIZATION,
};
use keygen::error::{KeygenError, Result};
use keygen::generator::{generate, write_certificate, write_private_key};
use log::error;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::LazyLock;
use std::time::Duration;

/// Exit status for an empty host list.
const EXIT_MISSING_HOSTS: u8 = 254;

static DEFAULT_EXPIRATION_TEXT: LazyLock<String> =
    LazyLock::new(|| format_duration(DEFAULT_EXPIRATION));

#[derive(Parser, Debug)]
#[command(name = "keygen")]
#[command(
    about = "Generate a self-signed certificate and private key for local TLS testing",
    long_about = None
)]
struct Cli {
    /// Comma-separated hosts and IP addresses to generate the certificate for
    #[arg(long, default_value = DEFAULT_HOSTS)]
    hosts: String,

    /// Duration that certificate is valid for
    #[arg(
        long,
        default_value = DEFAULT_EXPIRATION_TEXT.as_str(),
        value_parser = parse_duration
    )]
    expiration: Duration,

    /// Size of key to generate
    #[arg(long, default_value_t = DEFAULT_BITS)]
    bits: usize,

    /// Organization name
    #[arg(long, default_value = DEFAULT_ORGANIZATION)]
    org: String,

    /// File to write the certificate to
    #[arg(long, default_value = DEFAULT_CERT_PATH)]
    cert: PathBuf,

    /// File to write the key to (ignored unless --honor-key-path is set)
    #[arg(long, default_value = DEFAULT_KEY_PATH)]
    key: PathBuf,

    /// Write the key to --key instead of ./key.pem
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    honor_key_path: bool,

    /// Exit with an error when the key file cannot be written
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true"
    )]
    strict: bool,
}

impl Cli {
    fn into_config(self) -> GeneratorConfig {
        let policy = if self.honor_key_path {
            KeyPathPolicy::Honor
        } else {
            KeyPathPolicy::Legacy
        };

        GeneratorConfig::default()
            .hosts(self.hosts)
            .expiration(self.expiration)
            .bits(self.bits)
            .organization(self.org)
            .cert_path(self.cert)
            .key_path(self.key)
            .key_path_policy(policy)
            .strict(self.strict)
    }
}

/// Rewrite single-dash long flags (`-hosts`, `-bits=1024`) to the
/// double-dash form clap expects. Everything after `--` is left alone.
fn normalize_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let command = Cli::command();
    let longs: Vec<&str> = command
        .get_arguments()
        .filter_map(|arg| arg.get_long())
        .chain(["help"])
        .collect();

    let mut normalized = Vec::new();
    let mut passthrough = false;
    for (index, arg) in args.into_iter().enumerate() {
        if index == 0 || passthrough {
            normalized.push(arg);
            continue;
        }
        if arg.to_str() == Some("--") {
            passthrough = true;
            normalized.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|s| {
            let body = s.strip_prefix('-')?;
            if body.starts_with('-') {
                return None;
            }
            let name = body.split('=').next().unwrap_or(body);
            longs.contains(&name).then(|| OsString::from(format!("-{}", s)))
        });
        normalized.push(rewritten.unwrap_or(arg));
    }

    normalized
}

fn run(config: &GeneratorConfig) -> Result<()> {
    let artifacts = generate(config)?;

    let cert_path = write_certificate(config, &artifacts)?;
    println!("Certificate written to {}", cert_path.display());

    if write_private_key(config, &artifacts)?.is_some() {
        println!("Key written to {}", config.key_path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse_from(normalize_flags(std::env::args_os()));
    let config = cli.into_config();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(KeygenError::MissingHosts) => {
            eprintln!("{}", KeygenError::MissingHosts);
            eprint!("{}", Cli::command().render_help());
            ExitCode::from(EXIT_MISSING_HOSTS)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
