mod play;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdin, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eventrush_game::constants::{DEFAULT_DEPTH_THRESHOLD_HOURS, DEFAULT_MAX_DEPTH};
use eventrush_game::{
    ClimbOptions, GameFile, GameState, Move, Neighborhood, Objective, PrereqGraph,
    RestartOptions, ScoredPlan, SearchOptions, SessionRecorder, StartConfig, climb,
    format_duration, format_grouped, format_plan, parse_plan, restarts, timeline,
};
use play::Session;

#[derive(Debug, Parser)]
#[command(name = "eventrush-planner", version = "0.1.0")]
#[command(about = "Plan upgrade orders for timed idle-game events")]
struct Cli {
    /// Game definition (JSON); may be omitted when the start file names one
    #[arg(long, global = true)]
    game: Option<PathBuf>,

    /// Mid-event starting point (JSON)
    #[arg(long, global = true)]
    start: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play interactively, optionally exporting the session as CSV
    Play {
        /// Where to write the session CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a plan file and report its timeline and scores
    Score {
        plan: PathBuf,
        /// Optional path to write the report instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Hill-climb from a plan file
    Improve {
        plan: PathBuf,
        /// Rewritten with the best plan after every improvement
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Hill-climb from random plans and keep the best
    Random {
        /// Production switches to insert, per upgrade index (comma-separated)
        #[arg(long, value_delimiter = ',')]
        switches: Vec<usize>,
        #[arg(long, default_value_t = 1337)]
        seed: u64,
        #[arg(long, default_value_t = 10)]
        restarts: usize,
        /// Rewritten with the best plan whenever a restart beats it
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Print the prerequisite graph
    Graph {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct SearchArgs {
    /// Neighborhood: single or block
    #[arg(long, value_parser = parse_neighborhood, default_value = "single")]
    neighborhood: Neighborhood,

    /// Objective: points or spare
    #[arg(long, value_parser = parse_objective, default_value = "spare")]
    objective: Objective,

    /// Deepest lookahead tried once a pass stalls
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: usize,

    /// Take the first improving neighbor instead of the best one
    #[arg(long)]
    fast: bool,

    /// Stop deepening while the spare time is below this many hours
    #[arg(long, allow_hyphen_values = true)]
    depth_threshold: Option<f64>,
}

impl SearchArgs {
    fn climb_options(&self, default_threshold: Option<f64>) -> ClimbOptions {
        ClimbOptions {
            search: SearchOptions {
                neighborhood: self.neighborhood,
                objective: self.objective,
                depth: 1,
                first_improvement: self.fast,
            },
            max_depth: self.depth.max(1),
            depth_threshold: self.depth_threshold.or(default_threshold),
        }
    }
}

fn parse_neighborhood(s: &str) -> Result<Neighborhood, String> {
    s.parse()
        .map_err(|()| format!("expected single or block, got {s:?}"))
}

fn parse_objective(s: &str) -> Result<Objective, String> {
    s.parse()
        .map_err(|()| format!("expected points or spare, got {s:?}"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    announce_banner();
    let state = load_state(cli.game.as_deref(), cli.start.as_deref())?;
    match cli.command {
        Command::Play { output } => run_play(state, output),
        Command::Score { plan, output } => run_score(&state, &plan, output),
        Command::Improve {
            plan,
            output,
            search,
        } => run_improve(&state, &plan, output.as_deref(), &search),
        Command::Random {
            switches,
            seed,
            restarts: rounds,
            output,
            search,
        } => run_random(&state, switches, seed, rounds, output.as_deref(), &search),
        Command::Graph { output } => run_graph(&state, output),
    }
}

fn announce_banner() {
    println!("{}", "🎪 Eventrush Planner".bright_cyan().bold());
    println!("{}", "====================".cyan());
}

/// Build the starting state from a game file and an optional start file.
fn load_state(game: Option<&Path>, start: Option<&Path>) -> Result<GameState> {
    let start = start
        .map(|path| {
            StartConfig::load(path)
                .with_context(|| format!("failed to load start file {}", path.display()))
                .map(|config| (path, config))
        })
        .transpose()?;
    let game_path = match (game, &start) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some((path, config))) => config
            .game_path(path)
            .with_context(|| format!("{} names no game file; pass --game", path.display()))?,
        (None, None) => bail!("pass --game or a --start file that names one"),
    };
    let def = GameFile::load(&game_path)
        .and_then(GameFile::into_definition)
        .with_context(|| format!("failed to load game {}", game_path.display()))?;
    log::info!("game {} with {} upgrades", def.name, def.len());
    let mut state = GameState::new(Arc::new(def));
    if let Some((path, config)) = start {
        config
            .apply(&mut state)
            .with_context(|| format!("failed to apply start file {}", path.display()))?;
    }
    Ok(state)
}

fn load_plan(path: &Path, state: &GameState) -> Result<Vec<Move>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_plan(&text, state).with_context(|| format!("failed to parse {}", path.display()))
}

fn save_plan(path: &Path, plan: &[Move], state: &GameState) -> Result<()> {
    fs::write(path, format_plan(plan, state.definition()))
        .with_context(|| format!("failed to write {}", path.display()))
}

fn run_play(state: GameState, output: Option<PathBuf>) -> Result<()> {
    let recorder = output
        .map(|path| {
            File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))
                .map(|file| SessionRecorder::new(BufWriter::new(file), &state))
        })
        .transpose()?;
    let session = Session::new(state, recorder);
    log::info!(
        "playing {} with {} left",
        session.state().definition().name,
        format_duration(session.state().time_left())
    );
    let mut out = stdout();
    let (end, _) = session.run(stdin().lock(), &mut out)?;
    writeln!(
        out,
        "{}",
        format!("Finished with {} {}", format_grouped(end.points()), end.definition().points_name)
            .green()
            .bold()
    )?;
    Ok(())
}

fn run_score(state: &GameState, path: &Path, output: Option<PathBuf>) -> Result<()> {
    let plan = load_plan(path, state)?;
    let mut target = OutputTarget::new(output)?;
    write_score(target.writer(), state, &plan)?;
    target.flush_inner()?;
    Ok(())
}

fn write_score(out: &mut dyn Write, state: &GameState, plan: &[Move]) -> Result<()> {
    let def = state.definition();
    let line = timeline(plan, state)?;
    for entry in &line.entries {
        writeln!(
            out,
            "{:>10} left  {:<24} {:>12} {}",
            format_duration(def.event_secs - entry.at),
            entry.item.describe(def),
            format_grouped(entry.points),
            def.points_name
        )?;
    }
    for item in &line.skipped {
        writeln!(out, "{:>10}       {:<24} never reached", "-", item.describe(def))?;
    }
    let points = Objective::Points.score(plan, state)?;
    let spare = Objective::Spare.score(plan, state)?;
    writeln!(out, "{}: {}", def.points_name, format_grouped(points))?;
    match line.goal_reached_at {
        Some(at) => writeln!(
            out,
            "goal {} reached with {} to spare ({spare:.4} h)",
            format_grouped(def.goal),
            format_duration(def.event_secs - at)
        )?,
        None => writeln!(
            out,
            "goal {} missed by {spare:.4} h",
            format_grouped(def.goal)
        )?,
    }
    Ok(())
}

fn report_improvement(found: &ScoredPlan, depth: usize, objective: Objective) {
    println!(
        "{} {objective} {:.4} (depth {depth}, {} moves)",
        "▲".green().bold(),
        found.score,
        found.plan.len()
    );
}

fn run_improve(
    state: &GameState,
    path: &Path,
    output: Option<&Path>,
    search: &SearchArgs,
) -> Result<()> {
    let graph = PrereqGraph::build(state.definition())?;
    let plan = load_plan(path, state)?;
    if !graph.respects_order(&plan) {
        log::warn!("{} breaks the prerequisite order", path.display());
    }
    let opts = search.climb_options(None);
    let start = opts.search.objective.score(&plan, state)?;
    println!("start: {} {start:.4}", opts.search.objective);
    let best = climb(plan, state, &graph, &opts, |found, depth| {
        report_improvement(found, depth, opts.search.objective);
        if let Some(path) = output
            && let Err(err) = save_plan(path, &found.plan, state)
        {
            log::warn!("{err:#}");
        }
    })?;
    finish_search(state, output, &best)
}

fn run_random(
    state: &GameState,
    switches: Vec<usize>,
    seed: u64,
    rounds: usize,
    output: Option<&Path>,
    search: &SearchArgs,
) -> Result<()> {
    let graph = PrereqGraph::build(state.definition())?;
    let opts = RestartOptions {
        climb: search.climb_options(Some(DEFAULT_DEPTH_THRESHOLD_HOURS)),
        switches,
        restarts: rounds,
    };
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let best = restarts(state, &graph, &opts, &mut rng, |found, round| {
        println!(
            "{} restart {round}: {} {:.4}",
            "★".yellow().bold(),
            opts.climb.search.objective,
            found.score
        );
        if let Some(path) = output
            && let Err(err) = save_plan(path, &found.plan, state)
        {
            log::warn!("{err:#}");
        }
    })?;
    let Some(best) = best else {
        bail!("no restarts were run");
    };
    finish_search(state, output, &best)
}

fn finish_search(state: &GameState, output: Option<&Path>, best: &ScoredPlan) -> Result<()> {
    match output {
        Some(path) => {
            save_plan(path, &best.plan, state)?;
            println!("best plan written to {}", path.display());
        }
        None => print!("{}", format_plan(&best.plan, state.definition())),
    }
    let mut out = stdout().lock();
    write_score(&mut out, state, &best.plan)?;
    Ok(())
}

fn run_graph(state: &GameState, output: Option<PathBuf>) -> Result<()> {
    let graph = PrereqGraph::build(state.definition())?;
    let mut target = OutputTarget::new(output)?;
    write_graph(target.writer(), state, &graph)?;
    target.flush_inner()?;
    Ok(())
}

fn write_graph(out: &mut dyn Write, state: &GameState, graph: &PrereqGraph) -> Result<()> {
    let def = state.definition();
    let mut records: Vec<_> = graph.iter().collect();
    records.sort_by_key(|(item, _)| **item);
    for (item, needs) in records {
        let needs: Vec<String> = needs.iter().map(|n| n.describe(def)).collect();
        writeln!(out, "{:<28} <- {}", item.describe(def), needs.join(", "))?;
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
