//! Line-oriented host: turns typed text commands into registry calls and
//! formats the resulting events.

use core::str::FromStr;
use std::sync::Arc;

use crate::common::Coord;
use crate::config::EngineConfig;
use crate::events::{BoardView, Event};
use crate::game::PlayerId;
use crate::ledger::InMemoryLedger;
use crate::registry::{lock_session, Action, PairKey, SessionRegistry};
use crate::ship::Orientation;
use crate::ui::render_board;

pub const HELP: &str = "\
commands:
  start <player> <opponent>            challenge a player
  place <player> <len> <cell> <dir>    place a ship, dir is up/down/left/right
  remove <player> <len>                remove one ship of that length
  reset <player>                       remove all your ships
  ready <player>                       finish placement
  fire <player> <cell>                 fire at a cell such as B7
  board <player>                       show your fleet and shots
  end <player> <opponent>              abandon a game
  balance <player>                     show balance and win streak
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start {
        initiator: PlayerId,
        challenged: PlayerId,
    },
    Act {
        player: PlayerId,
        action: Action,
    },
    Show {
        player: PlayerId,
    },
    End {
        pair: PairKey,
    },
    Balance {
        player: PlayerId,
    },
    Help,
    Quit,
}

fn arity(words: &[&str], n: usize, usage: &str) -> anyhow::Result<()> {
    if words.len() != n + 1 {
        anyhow::bail!("usage: {}", usage);
    }
    Ok(())
}

fn ship_len(raw: &str) -> anyhow::Result<u8> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("ship length must be a number, got '{}'", raw))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some(&verb) = words.first() else {
            anyhow::bail!("empty command");
        };
        let player = || PlayerId::from(words[1]);
        let act = |action| Command::Act {
            player: PlayerId::from(words[1]),
            action,
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "start" => {
                arity(&words, 2, "start <player> <opponent>")?;
                Command::Start {
                    initiator: player(),
                    challenged: PlayerId::from(words[2]),
                }
            }
            "place" => {
                arity(&words, 4, "place <player> <len> <cell> <dir>")?;
                act(Action::PlaceShip {
                    length: ship_len(words[2])?,
                    origin: Coord::from_str(words[3])?,
                    orientation: words[4].parse::<Orientation>()?,
                })
            }
            "remove" => {
                arity(&words, 2, "remove <player> <len>")?;
                act(Action::RemoveShip {
                    length: ship_len(words[2])?,
                })
            }
            "reset" => {
                arity(&words, 1, "reset <player>")?;
                act(Action::ResetShips)
            }
            "ready" => {
                arity(&words, 1, "ready <player>")?;
                act(Action::FinishPlacement)
            }
            "fire" => {
                arity(&words, 2, "fire <player> <cell>")?;
                // validated by the session so a bad label reports InvalidTarget
                act(Action::Fire {
                    target: words[2].to_string(),
                })
            }
            "board" => {
                arity(&words, 1, "board <player>")?;
                Command::Show { player: player() }
            }
            "end" => {
                arity(&words, 2, "end <player> <opponent>")?;
                Command::End {
                    pair: PairKey::new(player(), PlayerId::from(words[2])),
                }
            }
            "balance" => {
                arity(&words, 1, "balance <player>")?;
                Command::Balance { player: player() }
            }
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => anyhow::bail!("unknown command '{}', try 'help'", other),
        };
        Ok(command)
    }
}

/// One line (or block) of output per event.
pub fn describe(event: &Event) -> String {
    match event {
        Event::BoardChanged {
            participant,
            view,
            board,
            ..
        } => {
            let title = match view {
                BoardView::Fleet => "fleet",
                BoardView::Shots => "shots",
            };
            format!("{}'s {}:\n{}", participant, title, render_board(board))
        }
        Event::PlacementReady { participant, .. } => {
            format!("{} has finished placing their ships", participant)
        }
        Event::ShipSunk { owner, length, .. } => {
            format!("{}'s ship of length {} was sunk!", owner, length)
        }
        Event::TurnChanged { holder, .. } => format!("{}, it's your turn to fire", holder),
        Event::GameOver { winner, loser, .. } => format!("{} beat {}!", winner, loser),
    }
}

/// A console session host backed by an in-memory ledger.
pub struct Console {
    registry: SessionRegistry,
    ledger: Arc<InMemoryLedger>,
}

impl Console {
    pub fn new(config: EngineConfig, opening_balance: u64) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(opening_balance));
        let registry = SessionRegistry::new(config).with_ledger(ledger.clone());
        Self { registry, ledger }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Run one command and return what to print. Rejections are reported
    /// as text, never as errors.
    pub async fn execute(&self, command: Command) -> Vec<String> {
        match command {
            Command::Start {
                initiator,
                challenged,
            } => match self.registry.start_session(initiator.clone(), challenged.clone()) {
                Ok(handle) => {
                    let id = lock_session(&handle).id();
                    vec![format!(
                        "game {} started: {} vs {}, place your ships",
                        id, initiator, challenged
                    )]
                }
                Err(e) => vec![e.to_string()],
            },
            Command::Act { player, action } => {
                match self.registry.route_action(&player, action).await {
                    Ok(report) => {
                        let mut lines = Vec::new();
                        if let Some(shot) = report.shot {
                            lines.push(format!("{}: {:?}", player, shot));
                        }
                        lines.extend(report.events.iter().map(describe));
                        lines
                    }
                    Err(e) => vec![e.to_string()],
                }
            }
            Command::Show { player } => match self.registry.session_for(&player) {
                Some(handle) => {
                    let session = lock_session(&handle);
                    match session.participant(&player) {
                        Some(p) => vec![
                            format!("{}'s fleet:\n{}", player, render_board(&p.board().snapshot())),
                            format!("{}'s shots:\n{}", player, render_board(&p.shots().snapshot())),
                        ],
                        None => vec!["No active game found".to_string()],
                    }
                }
                None => vec!["No active game found".to_string()],
            },
            Command::End { pair } => match self.registry.end_session(&pair) {
                Ok(()) => vec!["game abandoned".to_string()],
                Err(e) => vec![e.to_string()],
            },
            Command::Balance { player } => {
                let balance = self.ledger.balance(&player).await;
                let streak = self.ledger.streak(&player).await;
                vec![format!("{}: balance {}, win streak {}", player, balance, streak)]
            }
            Command::Help => vec![HELP.to_string()],
            Command::Quit => Vec::new(),
        }
    }
}
