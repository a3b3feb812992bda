use std::io::{BufRead, BufReader};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use url::Url;

use podplayer::{
    Command, Episode, EpisodeQuery, PlayerController, PlayerEvent, PlayerObserver, PlayerSession,
    ReqwestClient, SessionSnapshot, SimulatedDevice, SimulatedDeviceOptions, fetch_episode,
    fetch_episodes, format_duration,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static PLAYING: Emoji<'_, '_> = Emoji("▶️  ", "> ");
static PAUSED: Emoji<'_, '_> = Emoji("⏸️  ", "|| ");
static SHUFFLE: Emoji<'_, '_> = Emoji("🔀 ", "[S] ");
static REPEAT: Emoji<'_, '_> = Emoji("🔁 ", "[L] ");
static STOP: Emoji<'_, '_> = Emoji("⏹️  ", "[.] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");

/// Listen to podcast episodes from a podcast REST API
#[derive(Parser, Debug)]
#[command(name = "podplayer")]
#[command(about = "Listen to podcast episodes from a podcast REST API")]
#[command(version)]
struct Args {
    /// Base URL of the podcast API
    #[arg(long, env = "PODPLAYER_API_URL", default_value = "http://localhost:3333")]
    api_url: Url,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the latest episodes
    List {
        /// Maximum number of episodes to list
        #[arg(short, long, default_value = "12")]
        limit: usize,
    },

    /// Show the details of one episode
    Show {
        /// Episode id
        id: String,
    },

    /// Play the latest episodes as a queue
    Play {
        /// Position in the listing to start from
        #[arg(short, long, default_value = "0")]
        start: usize,

        /// Pick the next episode at random
        #[arg(long)]
        shuffle: bool,

        /// Repeat the current episode
        #[arg(long = "loop")]
        looping: bool,

        /// Maximum number of episodes to queue
        #[arg(short, long)]
        limit: Option<usize>,

        /// Playback speed multiplier for the simulated device
        #[arg(long, default_value = "1.0")]
        speed: f64,
    },
}

/// Prints notable state changes above the progress bar
struct TerminalObserver {
    bar: ProgressBar,
}

impl PlayerObserver for TerminalObserver {
    fn notify(&self, event: PlayerEvent) {
        match event {
            PlayerEvent::QueueReplaced { queue_len, index } => {
                self.bar.println(format!(
                    "{HEADPHONES}Queued {} episodes, starting at #{}",
                    queue_len.to_string().cyan(),
                    (index + 1).to_string().cyan()
                ));
            }
            PlayerEvent::LoopingChanged { is_looping } => {
                self.bar
                    .println(format!("{REPEAT}Repeat {}", on_off(is_looping)));
            }
            PlayerEvent::ShufflingChanged { is_shuffling } => {
                self.bar
                    .println(format!("{SHUFFLE}Shuffle {}", on_off(is_shuffling)));
            }
            PlayerEvent::Cleared => {
                self.bar.println(format!("{STOP}{}", "Queue finished".dimmed()));
            }
            PlayerEvent::EpisodeChanged { .. } | PlayerEvent::PlayingChanged { .. } => {}
        }
    }
}

fn on_off(value: bool) -> colored::ColoredString {
    if value { "on".green() } else { "off".dimmed() }
}

/// Draws the current episode and its progress
struct PlayerView {
    bar: ProgressBar,
}

impl PlayerView {
    fn new() -> Result<Self> {
        let style = ProgressStyle::default_bar()
            .template("{prefix} [{bar:30.green/magenta}] {wide_msg}")?
            .progress_chars("█▓░");

        let bar = ProgressBar::new(0);
        bar.set_style(style);

        Ok(Self { bar })
    }

    fn render(&self, snapshot: &SessionSnapshot) {
        let state = &snapshot.state;

        let Some(episode) = state.current_episode() else {
            self.bar.set_prefix(format_duration(0));
            self.bar.set_length(0);
            self.bar.set_position(0);
            self.bar
                .set_message(format!("{}", "Select a podcast to listen".dimmed()));
            return;
        };

        let status = if state.is_playing { &PLAYING } else { &PAUSED };
        let mut flags = String::new();
        if state.is_shuffling {
            flags.push_str(&SHUFFLE.to_string());
        }
        if state.is_looping {
            flags.push_str(&REPEAT.to_string());
        }

        self.bar.set_length(snapshot.progress.duration);
        self.bar.set_position(snapshot.progress.position);
        self.bar.set_prefix(format!(
            "{} / {}",
            format_duration(snapshot.progress.position),
            format_duration(snapshot.progress.duration)
        ));
        self.bar.set_message(format!(
            "{status}{flags}{} {}",
            truncate_title(&episode.title, 50).bold(),
            episode.members.dimmed()
        ));
    }
}

/// Line-based keyboard controls for the play command
enum Control {
    Send(Command),
    Quit,
}

fn parse_control(line: &str) -> Option<Control> {
    let command = match line.trim() {
        "" | "t" | "toggle" => Command::TogglePlay,
        "n" | "next" => Command::Next,
        "b" | "back" | "prev" => Command::Previous,
        "l" | "loop" => Command::ToggleLoop,
        "s" | "shuffle" => Command::ToggleShuffle,
        "c" | "clear" => Command::Clear,
        "q" | "quit" => return Some(Control::Quit),
        other => Command::Seek(parse_timestamp(other)?),
    };

    Some(Control::Send(command))
}

/// Parse `SS`, `MM:SS` or `HH:MM:SS` into seconds
fn parse_timestamp(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    parts
        .iter()
        .try_fold(0u64, |acc, part| Some(acc * 60 + part.parse::<u64>().ok()?))
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "podplayer=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_episode_line(position: usize, episode: &Episode) {
    println!(
        "{:>3}  {}",
        (position + 1).to_string().cyan(),
        episode.title.bold()
    );
    println!(
        "     {} • {} • {}",
        episode.members.dimmed(),
        episode.published_label(),
        episode.duration_label().yellow()
    );
}

async fn list(client: &ReqwestClient, api_url: &Url, limit: usize) -> Result<()> {
    let query = EpisodeQuery {
        limit: Some(limit),
        ..Default::default()
    };

    let episodes = fetch_episodes(client, api_url, &query)
        .await
        .context("Failed to fetch episodes")?;

    if episodes.is_empty() {
        println!("{}", "No episodes available".dimmed());
        return Ok(());
    }

    for (position, episode) in episodes.iter().enumerate() {
        print_episode_line(position, episode);
    }

    Ok(())
}

async fn show(client: &ReqwestClient, api_url: &Url, id: &str) -> Result<()> {
    let episode = fetch_episode(client, api_url, id)
        .await
        .with_context(|| format!("Failed to fetch episode '{id}'"))?;

    println!("{}", episode.title.bold().green());
    println!(
        "{} • {} • {}",
        episode.members.dimmed(),
        episode.published_label(),
        episode.duration_label().yellow()
    );
    println!("{}\n", episode.url.as_str().cyan());
    println!("{}", episode.description_text());

    Ok(())
}

/// Forward input lines from a plain thread
///
/// A blocking stdin read cannot be cancelled, so the thread is never joined;
/// it goes away with the process. The channel closes at end of input.
fn spawn_line_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        for line in input.lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    rx
}

struct PlayOptions {
    start: usize,
    shuffle: bool,
    looping: bool,
    limit: Option<usize>,
    speed: f64,
}

async fn play(client: &ReqwestClient, api_url: &Url, options: PlayOptions) -> Result<()> {
    ensure!(
        options.speed.is_finite() && options.speed > 0.0,
        "Speed must be a positive number"
    );

    let query = EpisodeQuery {
        limit: options.limit,
        ..Default::default()
    };
    let episodes = fetch_episodes(client, api_url, &query)
        .await
        .context("Failed to fetch episodes")?;
    if episodes.is_empty() {
        bail!("No episodes available to play");
    }

    let view = PlayerView::new()?;
    let observer = Arc::new(TerminalObserver {
        bar: view.bar.clone(),
    });
    let controller = PlayerController::with_observer(observer);

    let tick = Duration::try_from_secs_f64(1.0 / options.speed)
        .with_context(|| format!("Speed {} is out of range", options.speed))?;
    let (device, device_events) = SimulatedDevice::new(SimulatedDeviceOptions { tick, step: 1.0 });

    let mut session = PlayerSession::new(controller, device);
    if options.shuffle {
        session.handle_command(Command::ToggleShuffle)?;
    }
    if options.looping {
        session.handle_command(Command::ToggleLoop)?;
    }
    session
        .handle_command(Command::PlayList {
            episodes,
            index: options.start,
        })
        .context("Failed to start playback")?;

    let mut updates = session.subscribe();
    let (commands, command_rx) = mpsc::channel(16);
    let handle = tokio::spawn(session.run(command_rx, device_events));

    view.bar.println(format!(
        "{}",
        "Enter: play/pause  n: next  b: previous  s: shuffle  l: loop  [HH:]MM:SS: seek  q: quit"
            .dimmed()
    ));
    view.render(&updates.borrow_and_update());

    let mut lines = spawn_line_reader(BufReader::new(std::io::stdin()));
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                view.render(&snapshot);
                if snapshot.state.current_index.is_none() {
                    break;
                }
            }
            line = lines.recv(), if stdin_open => match line {
                Some(line) => match parse_control(&line) {
                    Some(Control::Send(command)) => {
                        if commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    Some(Control::Quit) => break,
                    None => view.bar.println(format!("{FAILURE}Unknown control '{}'", line.trim())),
                },
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(commands);
    let final_state = handle.await.context("Player session panicked")?;
    view.bar.finish_and_clear();

    if let Some(episode) = final_state.current_episode() {
        println!("{STOP}Stopped at {}", episode.title.bold());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let today = chrono::Local::now().format("%a, %-d %B");
    println!(
        "\n{}{} {} {}\n",
        MICROPHONE,
        "podplayer".bold().magenta(),
        "- The best for you to listen to, always".dimmed(),
        today.to_string().cyan()
    );

    let client = ReqwestClient::new();

    match args.command {
        Cmd::List { limit } => list(&client, &args.api_url, limit).await,
        Cmd::Show { id } => show(&client, &args.api_url, &id).await,
        Cmd::Play {
            start,
            shuffle,
            looping,
            limit,
            speed,
        } => {
            let options = PlayOptions {
                start,
                shuffle,
                looping,
                limit,
                speed,
            };
            play(&client, &args.api_url, options).await
        }
    }
}
