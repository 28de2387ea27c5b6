use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::{LevelFilter, debug};
use threadsafe_core::{
    DEFAULT_MAX_THREAD_LEN, HttpDownloader, RenderOptions, SaveRequest, Settings, TweetUri,
    TwitterClient, list_threads, regen_thread, render_archive_list, save_thread,
};

#[derive(Debug, Parser)]
#[command(
    name = "thread-safe",
    version,
    about = "Save a local copy of a Twitter thread",
    after_help = "Environment:\n  THREAD_SAFE_PATH   top-level directory for saved threads (default: .)\n  THREAD_SAFE_TOKEN  Twitter API bearer token"
)]
struct Cli {
    /// Top-level directory for saved threads, overrides THREAD_SAFE_PATH
    #[arg(long, global = true, value_name = "DIR")]
    path: Option<PathBuf>,

    /// Log verbosity
    #[arg(short, long, global = true, value_name = "LEVEL", default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Save thread content and generate a local html file
    Save {
        /// Name to use for the thread
        name: String,

        /// URL or ID of the last tweet in a single-author thread
        last_tweet: String,

        /// Optional path to a CSS file
        #[arg(short, long)]
        css: Option<PathBuf>,

        /// Optional path to a template file
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Do not download media attachments
        #[arg(long)]
        no_attachments: bool,

        /// Maximum number of tweets to fetch
        #[arg(long, default_value_t = DEFAULT_MAX_THREAD_LEN)]
        limit: usize,

        /// Twitter API bearer token, overrides THREAD_SAFE_TOKEN
        #[arg(long)]
        token: Option<String>,
    },

    /// Regenerate an html file from a previously saved thread
    Regen {
        /// Name given to the thread
        name: String,

        /// Optional path to a CSS file
        #[arg(short, long)]
        css: Option<PathBuf>,

        /// Optional path to a template file
        #[arg(short, long)]
        template: Option<PathBuf>,
    },

    /// List previously saved threads
    List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl From<LogLevel> for LevelFilter {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level.into())
        .format_timestamp_secs()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> threadsafe_core::Result<()> {
    let settings = Settings::from_env()?.with_overrides(cli.path, None);
    debug!("archive root: {}", settings.root.display());

    match cli.command {
        Command::Save {
            name,
            last_tweet,
            css,
            template,
            no_attachments,
            limit,
            token,
        } => {
            let settings = settings.with_overrides(None, token);
            let client = TwitterClient::new(settings.require_token()?)?;
            let downloader = HttpDownloader::new()?;

            let request = SaveRequest {
                limit,
                download_attachments: !no_attachments,
                render: RenderOptions { template, css },
                ..SaveRequest::new(name, TweetUri::parse(&last_tweet)?)
            };

            let result = save_thread(&settings, &client, &downloader, &request)?;
            println!(
                "saved {} tweet(s) and {} attachment(s) to {}",
                result.tweet_count,
                result.attachment_count,
                result.dir.display()
            );
        }
        Command::Regen {
            name,
            css,
            template,
        } => {
            let path = regen_thread(&settings, &name, &RenderOptions { template, css })?;
            println!("wrote {}", path.display());
        }
        Command::List => {
            let summaries = list_threads(&settings)?;
            print!("{}", render_archive_list(&summaries));
        }
    }

    Ok(())
}
