use std::sync::Arc;

use battleship_arena::prelude::*;
use battleship_arena::{random_fleet, Board, InMemoryLedger, ShipRegistry, TurnPolicy};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::json;

/// Play one random-vs-random game and print a JSON summary.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    seed: u64,
    #[arg(long, value_enum, help = "Overrides BATTLESHIP_TURN_POLICY")]
    turn_policy: Option<TurnPolicy>,
    #[arg(long, help = "Overrides BATTLESHIP_WIN_REWARD")]
    win_reward: Option<u64>,
    #[arg(long, help = "Overrides BATTLESHIP_LOSS_PENALTY")]
    loss_penalty: Option<u64>,
    #[arg(long, default_value_t = 1000)]
    opening_balance: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut rng = SmallRng::seed_from_u64(cli.seed);

    let mut config = EngineConfig::from_env()?;
    if let Some(policy) = cli.turn_policy {
        config.turn_policy = policy;
    }
    if let Some(reward) = cli.win_reward {
        config.win_reward = reward;
    }
    if let Some(penalty) = cli.loss_penalty {
        config.loss_penalty = penalty;
    }
    let ledger = Arc::new(InMemoryLedger::new(cli.opening_balance));
    let registry = SessionRegistry::new(config.clone()).with_ledger(ledger.clone());

    let p1 = PlayerId::from("player1");
    let p2 = PlayerId::from("player2");
    registry
        .start_session(p1.clone(), p2.clone())
        .map_err(|e| anyhow::anyhow!(e))?;

    for player in [&p1, &p2] {
        let mut board = Board::new();
        let mut ships = ShipRegistry::new();
        random_fleet(&mut rng, &config.fleet, &mut board, &mut ships)
            .map_err(|e| anyhow::anyhow!(e))?;
        for ship in ships.iter() {
            registry
                .route_action(
                    player,
                    Action::PlaceShip {
                        length: ship.len(),
                        origin: ship.origin(),
                        orientation: ship.orientation(),
                    },
                )
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        registry
            .route_action(player, Action::FinishPlacement)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    // each side fires at its own shuffled list of every cell
    let mut targets = [Coord::all().collect::<Vec<_>>(), Coord::all().collect::<Vec<_>>()];
    for list in targets.iter_mut() {
        list.shuffle(&mut rng);
    }
    let mut shots = [0usize; 2];
    let mut hits = [0usize; 2];
    let mut holder = p2.clone();
    let mut winner = None;

    while winner.is_none() {
        let seat = usize::from(holder == p2);
        let target = targets[seat]
            .pop()
            .ok_or_else(|| anyhow::anyhow!("{} ran out of targets", holder))?;
        let report = registry
            .route_action(
                &holder,
                Action::Fire {
                    target: target.to_string(),
                },
            )
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        shots[seat] += 1;
        if report.shot == Some(FireOutcome::Hit) {
            hits[seat] += 1;
        }
        for event in &report.events {
            match event {
                Event::TurnChanged { holder: next, .. } => holder = next.clone(),
                Event::GameOver { winner: w, .. } => winner = Some(w.clone()),
                _ => {}
            }
        }
    }

    let result = json!({
        "seed": cli.seed,
        "turn_policy": format!("{:?}", config.turn_policy),
        "player1": {
            "shots": shots[0],
            "hits": hits[0],
            "balance": ledger.balance(&p1).await,
        },
        "player2": {
            "shots": shots[1],
            "hits": hits[1],
            "balance": ledger.balance(&p2).await,
        },
        "winner": winner.map(|w| w.to_string()),
    });
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
