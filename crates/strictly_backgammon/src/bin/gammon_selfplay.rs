//! Gammon Selfplay - plays a whole match between two random movers
//!
//! Each side picks a uniformly random maximal move sequence. The cube is
//! driven by a pip-count policy: double when leading by enough, take unless
//! trailing too far.

#![warn(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use strictly_backgammon::{
    Game, GameEvent, MatchRules, MatchSession, Player, RandomDice, TurnPhase,
};
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

/// Gammon Selfplay - random-move backgammon match driver
#[derive(Parser, Debug)]
#[command(name = "gammon_selfplay")]
#[command(about = "Plays a backgammon match between two random movers", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML file with match rules (overrides the rule flags)
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Points needed to win; money play when absent
    #[arg(short, long)]
    match_length: Option<u32>,

    /// Disable the Crawford rule
    #[arg(long)]
    no_crawford: bool,

    /// Enable the Jacoby rule
    #[arg(long)]
    jacoby: bool,

    /// Refuse doubles once the current cube value already wins the match
    #[arg(long)]
    dead_cube: bool,

    /// Enable the Holland rule for post-Crawford games
    #[arg(long)]
    holland: bool,

    /// Seed for dice and move choice
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many games (money play never ends on its own)
    #[arg(long, default_value = "25")]
    max_games: u32,

    /// Pip lead at which a player doubles
    #[arg(long, default_value = "15")]
    double_lead: u32,

    /// Largest pip deficit at which a double is taken
    #[arg(long, default_value = "25")]
    take_limit: u32,
}

/// Pip-count cube policy.
#[derive(Debug, Clone, Copy)]
struct CubePolicy {
    double_lead: u32,
    take_limit: u32,
}

impl CubePolicy {
    fn lead(game: &Game, player: Player) -> i64 {
        let board = game.board();
        i64::from(board.pip_count(player.opponent())) - i64::from(board.pip_count(player))
    }

    fn should_double(&self, game: &Game, player: Player) -> bool {
        game.can_offer_double(player).is_ok()
            && Self::lead(game, player) >= i64::from(self.double_lead)
    }

    fn should_take(&self, game: &Game, responder: Player) -> bool {
        -Self::lead(game, responder) <= i64::from(self.take_limit)
    }
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let rules = load_rules(&cli)?;
    let policy = CubePolicy {
        double_lead: cli.double_lead,
        take_limit: cli.take_limit,
    };

    let (mut dice, mut rng) = match cli.seed {
        Some(seed) => (
            RandomDice::seeded(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (RandomDice::new(), StdRng::from_os_rng()),
    };

    let session = play_match(rules, policy, cli.max_games, &mut dice, &mut rng)?;
    let state = session.state();
    println!(
        "games: {}  white: {}  black: {}  winner: {}",
        state.games_played(),
        state.score(Player::White),
        state.score(Player::Black),
        state
            .winner()
            .map_or_else(|| "none".to_string(), |p| p.to_string()),
    );
    Ok(())
}

#[instrument(skip(cli))]
fn load_rules(cli: &Cli) -> Result<MatchRules> {
    if let Some(path) = &cli.rules {
        return MatchRules::from_file(path)
            .with_context(|| format!("loading rules from {}", path.display()));
    }
    let rules = match cli.match_length {
        Some(length) => MatchRules::match_to(length),
        None => MatchRules::money(cli.jacoby),
    }
    .with_crawford(!cli.no_crawford)
    .with_jacoby(cli.jacoby)
    .with_dead_cube(cli.dead_cube)
    .with_holland(cli.holland);
    rules.validate()?;
    Ok(rules)
}

#[instrument(skip(policy, dice, rng))]
fn play_match(
    rules: MatchRules,
    policy: CubePolicy,
    max_games: u32,
    dice: &mut RandomDice,
    rng: &mut StdRng,
) -> Result<MatchSession> {
    let mut session = MatchSession::new(rules, Player::White)?;
    let mut first = Player::White;

    loop {
        play_game(&mut session, policy, dice, rng)?;
        if session.is_match_over() || session.state().games_played() >= max_games {
            return Ok(session);
        }
        first = first.opponent();
        session.start_next_game(first)?;
        log_events(&mut session);
    }
}

fn play_game(
    session: &mut MatchSession,
    policy: CubePolicy,
    dice: &mut RandomDice,
    rng: &mut StdRng,
) -> Result<()> {
    while !session.game().is_over() {
        let game = session.game();
        let player = game.player_to_act();

        if game.cube().offer_pending_from().is_some() {
            let take = policy.should_take(game, player);
            session.respond_to_double(take)?;
        } else if policy.should_double(game, player) {
            session.offer_double(player)?;
        } else {
            session.roll_with(dice)?;
            while !session.game().is_over()
                && session.game().turn().phase() == TurnPhase::AwaitingMove
            {
                let sequences = session.game().legal_sequences().sequences();
                if sequences.is_empty() {
                    anyhow::bail!("no legal sequence while awaiting a move");
                }
                let sequence = sequences[rng.random_range(0..sequences.len())].clone();
                session.commit_sequence(&sequence)?;
            }
        }
        log_events(session);
    }
    Ok(())
}

fn log_events(session: &mut MatchSession) {
    for event in session.drain_events() {
        match event {
            GameEvent::GameEnded { .. } | GameEvent::MatchEnded { .. } => info!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }
    }
}
