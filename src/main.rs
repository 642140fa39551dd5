use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use beat_aggregator::{cli, clock::Canceller, config, error, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve track references and write their URIs to uris.txt
    Uris(ReferencesOptions),

    /// Fetch audio analyses and write them to analysis.json
    Analysis(AnalysisOptions),

    /// Play tracks on a device and wait until they finished
    Play(PlayOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ReferencesOptions {
    /// Track titles or spotify:track URIs; `-` reads the rest from stdin
    #[clap(required = true)]
    references: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AnalysisOptions {
    /// Keep resolved queries at their input position
    #[clap(long)]
    preserve_order: bool,

    /// Track titles or spotify:track URIs; `-` reads the rest from stdin
    #[clap(required = true)]
    references: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlayOptions {
    /// Do not queue the priming track in front of the requested tracks
    #[clap(long)]
    no_priming: bool,

    /// Do not check the tracks directory after playback
    #[clap(long)]
    skip_verify: bool,

    /// spotify:track URIs; `-` reads the rest from stdin
    #[clap(required = true)]
    uris: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("No environment file loaded, using defaults. Err: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Uris(opt) => cli::uris(opt.references).await,
        Command::Analysis(opt) => cli::analysis(opt.references, opt.preserve_order).await,
        Command::Play(opt) => {
            // device polling and the countdown stop on Ctrl-C
            let canceller = Canceller::new();
            let cancel = canceller.token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warning!("Interrupted, stopping...");
                    canceller.cancel();
                }
            });

            let options = cli::PlayOptions {
                no_priming: opt.no_priming,
                skip_verify: opt.skip_verify,
            };
            cli::play(opt.uris, options, cancel).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
