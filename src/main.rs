use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use winsane::config::{Settings, ThemeMode, DEFAULT_REMOTE_URL};
use winsane::error::{Notices, TweakError};
use winsane::power::{self, Delay, PowerAction};
use winsane::session::{Origin, Session, Toggled};
use winsane::utils::{CommandRunner, DryRun, ElevatedShell};
use winsane::{logging, ui};

#[derive(Parser)]
#[command(author, version, about = "Switch Windows tweaks on and off", long_about = None)]
struct Cli {
    /// Path of the local tweak document
    #[arg(long, global = true, env = "WINSANE_CONFIG")]
    config: Option<PathBuf>,

    /// Where the published tweak catalogue is fetched from
    #[arg(long, global = true, env = "WINSANE_URL")]
    url: Option<String>,

    /// Seconds to wait for the remote catalogue
    #[arg(long, global = true, default_value_t = 5)]
    timeout: u64,

    /// Use the local document only
    #[arg(long, global = true)]
    offline: bool,

    /// Print commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Lists features, categories and tweaks with their state
    List {
        /// Only show this feature
        #[arg(long)]
        feature: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Switches a tweak on or off; flips it when neither --on nor --off is given
    Toggle {
        /// The name of the tweak
        name: String,
        #[arg(long)]
        feature: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, conflicts_with = "off")]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Shows or changes the theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
    /// Fetches the catalogue and merges it with the saved choices
    Sync,
    /// Schedules a shutdown, restart or restart into firmware setup
    Schedule {
        /// shutdown, restart or firmware
        action: PowerAction,
        #[arg(long, default_value_t = 0)]
        hours: u64,
        #[arg(long, default_value_t = 0)]
        minutes: u64,
        #[arg(long, default_value_t = 0)]
        seconds: u64,
    },
}

#[derive(clap::Subcommand)]
enum ThemeAction {
    /// Prints the current mode and accent color
    Show,
    /// Sets the mode: dark, light or system
    Mode { mode: ThemeMode },
    /// Steps system -> dark -> light -> system
    Cycle,
    /// Sets the accent color (#RRGGBB)
    Accent { color: String },
}

impl Cli {
    fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            document_path: self.config.clone().unwrap_or(defaults.document_path),
            remote_url: if self.offline {
                None
            } else {
                Some(self.url.clone().unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string()))
            },
            fetch_timeout: Duration::from_secs(self.timeout),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let runner: Box<dyn CommandRunner> = if cli.dry_run {
        Box::new(DryRun)
    } else {
        Box::new(ElevatedShell)
    };
    let styled = std::io::stdout().is_terminal();
    let settings = cli.settings();

    let command = cli.command.unwrap_or(Commands::List {
        feature: None,
        json: false,
    });

    if let Commands::Schedule {
        action,
        hours,
        minutes,
        seconds,
    } = command
    {
        let delay = Delay {
            hours,
            minutes,
            seconds,
        };
        let total = delay.total_seconds()?;
        let issued = power::schedule(action, delay, runner.as_ref())?;
        report_command(cli.dry_run, &issued);
        println!("Scheduled {} in {} seconds.", action, total);
        return Ok(());
    }

    let mut notices = Notices::new();
    let started = Session::start(&settings, &mut notices);
    eprint!("{}", notices);
    let mut session = started?;

    match command {
        Commands::List { feature, json } => {
            if json {
                let value = ui::listing_json(session.document(), feature.as_deref());
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", ui::render_listing(session.document(), feature.as_deref(), styled));
            }
        }
        Commands::Toggle {
            name,
            feature,
            category,
            on,
            off,
        } => {
            let key = session.find(&name, feature.as_deref(), category.as_deref())?;
            let target = match (on, off) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            match session.toggle(&key, target, runner.as_ref()) {
                Ok(toggled) => report_toggle(cli.dry_run, &toggled),
                Err(TweakError::Unsaved { toggled, source }) => {
                    report_toggle(cli.dry_run, &toggled);
                    eprintln!("warning: {}", source);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Theme { action } => match action.unwrap_or(ThemeAction::Show) {
            ThemeAction::Show => print!("{}", ui::render_theme(session.document(), styled)),
            ThemeAction::Mode { mode } => {
                warn_on_err(session.set_theme_mode(mode).map(|_| ()));
                println!("Theme mode set to {}.", mode);
            }
            ThemeAction::Cycle => {
                let next = session.document().theme_mode().next();
                warn_on_err(session.cycle_theme().map(|_| ()));
                println!("Theme mode set to {}.", next);
            }
            ThemeAction::Accent { color } => match session.set_accent_color(&color) {
                Ok(accent) => println!("Accent color set to {}.", accent),
                Err(TweakError::Persist(e)) => {
                    if let Some(accent) = session.document().theme.as_ref().and_then(|t| t.accent_color.as_deref()) {
                        println!("Accent color set to {}.", accent);
                    }
                    eprintln!("warning: {}", e);
                }
                Err(e) => return Err(e.into()),
            },
        },
        Commands::Sync => {
            let source = match session.origin() {
                Origin::Merged => "Merged the remote catalogue with local choices",
                Origin::Remote => "Saved the remote catalogue",
                Origin::Local => "Using the local configuration",
            };
            let count = session.document().items().count();
            println!(
                "{} ({} tweaks) at {}",
                source,
                count,
                session.store().path().display()
            );
        }
        // Runs before the session starts.
        Commands::Schedule { .. } => {}
    }

    Ok(())
}

fn report_toggle(dry_run: bool, toggled: &Toggled) {
    if !toggled.command.is_empty() {
        report_command(dry_run, &toggled.command);
    }
    let state = if toggled.enabled { "Enabled" } else { "Disabled" };
    println!("{} '{}' ({})", state, toggled.key.name, toggled.key);
}

fn report_command(dry_run: bool, command: &str) {
    if dry_run {
        println!("would run: {}", command);
    }
}

fn warn_on_err(result: Result<(), winsane::ConfigError>) {
    if let Err(e) = result {
        eprintln!("warning: {}", e);
    }
}
