use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use connect_four_online::ai::{BotLevel, BotStrategy, NegamaxBot};
use connect_four_online::config::AppConfig;
use connect_four_online::game::{Board, Cell, Game, GameOutcome, PlayerId, PlayerRole};
use connect_four_online::net::{LoopbackRelay, LoopbackSettings};
use connect_four_online::orchestrator::{GameMode, MatchOrchestrator, MoveReceiver};

/// Play one Connect Four match headless, with a bot driving the local seats.
#[derive(Parser)]
#[command(name = "connect-four", about = "Play a headless Connect Four match")]
struct Cli {
    /// Game mode: single, two or online
    #[arg(long, default_value = "single")]
    mode: GameMode,

    /// Opponent level: easy, medium or hard. Blank uses the default level.
    #[arg(long, default_value = "")]
    level: String,

    /// Level of the bot playing the local human seats
    #[arg(long, default_value = "medium")]
    autopilot: BotLevel,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Seed every bot for a reproducible match
    #[arg(long)]
    seed: Option<u64>,

    /// Let the online opponent open the game
    #[arg(long)]
    remote_first: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("connect_four_online=info".parse()?))
        .init();

    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(seed) = cli.seed {
        config.bot.easy.seed = Some(seed);
        config.bot.medium.seed = Some(seed.wrapping_add(1));
        config.bot.hard.seed = Some(seed.wrapping_add(2));
    }
    let level = BotLevel::parse_optional(&cli.level)?;

    let mut orchestrator = MatchOrchestrator::from_config(&config);
    if cli.mode == GameMode::Online {
        let relay = LoopbackRelay::new(LoopbackSettings {
            board: config.board,
            opponent: config.bot.profile(level.unwrap_or_default()),
            local_moves_first: !cli.remote_first,
            ..Default::default()
        });
        orchestrator = orchestrator.with_service(Arc::new(relay));
    }

    let autopilot = NegamaxBot::for_level(&config.bot, cli.autopilot);
    let result = play(&mut orchestrator, cli.mode, level, &autopilot).await;
    orchestrator.close();
    result
}

async fn play(
    orchestrator: &mut MatchOrchestrator,
    mode: GameMode,
    level: Option<BotLevel>,
    autopilot: &NegamaxBot,
) -> Result<()> {
    let mut events = orchestrator.subscribe();
    orchestrator.start_game(mode, level).await?;
    report(&mut events);

    loop {
        let Some(game) = orchestrator.game() else {
            bail!("no active game");
        };
        if !game.is_running() {
            println!("{}", render(game.board(), game.players()[0].id()));
            print_outcome(game);
            return Ok(());
        }

        let seat = *game.next_player();
        if seat.role() != PlayerRole::Human {
            bail!("{} seat {} is due but was not driven", seat.role().name(), seat.id());
        }
        let column = autopilot
            .generate_move(game.board(), seat.id())
            .context("autopilot found no legal column")?;
        orchestrator.next_move(seat.id(), column).await?;
        report(&mut events);
    }
}

fn report(events: &mut MoveReceiver) {
    while let Ok(event) = events.try_recv() {
        tracing::info!(
            player = %event.player_id,
            column = event.column,
            row = event.row,
            connected = event.is_connected,
            tie = event.is_tie,
            "move"
        );
    }
}

fn print_outcome(game: &Game) {
    match game.outcome() {
        Some(GameOutcome::Winner(id)) => {
            let role = game.player(id).map_or("unknown", |p| p.role().name());
            println!("Player {id} ({role}) wins after {} moves", game.move_count());
        }
        Some(GameOutcome::Draw) => println!("Draw after {} moves", game.move_count()),
        None => println!("Game ended without a result ({:?})", game.status()),
    }
}

/// Top row first; `first` plays `X`.
fn render(board: &Board, first: PlayerId) -> String {
    let mut out = String::new();
    for row in (0..board.height()).rev() {
        for column in 0..board.width() {
            let symbol = match board.get(column, row) {
                Cell::Empty => '.',
                Cell::Owned(id) if id == first => 'X',
                Cell::Owned(_) => 'O',
            };
            out.push(symbol);
        }
        out.push('\n');
    }
    out.extend((0..board.width()).map(|c| char::from_digit((c % 10) as u32, 10).unwrap_or('?')));
    out
}
