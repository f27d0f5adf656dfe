use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use bandrec::{
    cli::{self, RecommendRequest},
    config, error,
    taste::{
        DEFAULT_GENRE_WEIGHT, DEFAULT_POPULARITY_WEIGHT, HistoryRequest, ScoringPolicy, TimeRange,
        TopSource,
    },
};

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
  args_conflicts_with_subcommands = true, // disallow mixing a bands file with `auth`
  subcommand_negates_reqs = true
)]
struct Cli {
    #[command(flatten)]
    recommend: RecommendOptions,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API and cache the token
    Auth,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct RecommendOptions {
    /// Text file with one band name per line
    #[clap(required = true)]
    pub bands_file: Option<PathBuf>,

    /// Where to save the full results (default: <bands file>_recommendations.json)
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Number of bands to show on the console
    #[clap(long, default_value_t = 10)]
    pub top: usize,

    /// Top list the taste profile is built from
    #[clap(long, value_enum, default_value_t = TopSource::Tracks)]
    pub source: TopSource,

    /// Time frame of the top list
    #[clap(long, value_enum, default_value_t = TimeRange::ShortTerm)]
    pub time_range: TimeRange,

    /// Number of top items to fetch
    #[clap(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub limit: u32,

    /// Weight of the genre overlap in the score
    #[clap(long, default_value_t = DEFAULT_GENRE_WEIGHT)]
    pub genre_weight: f64,

    /// Weight of the popularity proximity in the score
    #[clap(long, default_value_t = DEFAULT_POPULARITY_WEIGHT)]
    pub popularity_weight: f64,

    /// Count every shared genre equally instead of weighting it by how often it occurs in your history
    #[clap(long)]
    pub unweighted_genres: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Auth) => cli::auth().await,
        Some(Command::Completions(opt)) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
        None => {
            let opt = cli.recommend;
            let Some(bands_file) = opt.bands_file else {
                error!("Missing bands file. Run bandrec --help for usage.");
            };

            let policy = match ScoringPolicy::new(
                opt.genre_weight,
                opt.popularity_weight,
                !opt.unweighted_genres,
            ) {
                Ok(policy) => policy,
                Err(e) => error!("Invalid scoring weights: {}", e),
            };

            cli::recommend(RecommendRequest {
                bands_file,
                output: opt.output,
                top: opt.top,
                history: HistoryRequest {
                    source: opt.source,
                    time_range: opt.time_range,
                    limit: opt.limit,
                },
                policy,
            })
            .await
        }
    }
}
