use battleship_arena::console::{Command, Console};
use battleship_arena::{init_logging, EngineConfig, TurnPolicy};

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host games on this terminal, reading commands from stdin.
    Play {
        #[arg(long, value_enum, help = "Overrides BATTLESHIP_TURN_POLICY")]
        turn_policy: Option<TurnPolicy>,
        #[arg(long, help = "Overrides BATTLESHIP_WIN_REWARD")]
        win_reward: Option<u64>,
        #[arg(long, help = "Overrides BATTLESHIP_LOSS_PENALTY")]
        loss_penalty: Option<u64>,
        #[arg(long, default_value_t = 1000)]
        opening_balance: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            turn_policy,
            win_reward,
            loss_penalty,
            opening_balance,
        } => {
            let mut config = EngineConfig::from_env()?;
            if let Some(policy) = turn_policy {
                config.turn_policy = policy;
            }
            if let Some(reward) = win_reward {
                config.win_reward = reward;
            }
            if let Some(penalty) = loss_penalty {
                config.loss_penalty = penalty;
            }
            println!("Battleship arena ({:?}). Type 'help' for commands.", config.turn_policy);
            let console = Console::new(config, opening_balance);

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }
                for out in console.execute(command).await {
                    println!("{}", out);
                }
            }
            if !console.registry().is_empty() {
                println!("{} game(s) left unfinished", console.registry().len());
            }
        }
    }
    Ok(())
}
