//! Line-oriented driver for a game session.
//!
//! Reads one command per line from stdin and prints results as JSON on
//! stdout. Logs go to stderr. Type `help` for the command list.

use anyhow::{bail, Context};
use serde::Serialize;
use sheep_client::{init_tracing, ClientConfig, GameSession, SessionEvent};
use sheep_shared::constants::APP_NAME;
use sheep_shared::BoxKind;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;

const HELP: &str = "\
commands:
  click [n]              click the sheep n times (default 1)
  daily                  claim the daily wool coins
  gems                   claim the daily sheep gem
  box daily|premium      open a box
  buy <collectible>      buy a collectible with gems
  equip <collectible>    select a sheep or particle
  theme buy|use <id>     buy or switch theme
  say <message>          post to the global chat
  nick <name>            change nickname
  tier <level>           pin the displayed tier
  top                    leaderboard
  stats                  statistics summary
  state                  full session snapshot
  events                 session events since the last call
  quit                   flush and exit";

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) -> anyhow::Result<()> {
    match result {
        Ok(value) => print(&value),
        Err(e) => {
            println!("rejected: {e}");
            Ok(())
        }
    }
}

/// Everything buffered in `events`, plus how many older events were dropped
/// because the receiver fell behind.
fn drain_events(events: &mut Receiver<SessionEvent>) -> (Vec<SessionEvent>, u64) {
    let mut drained = Vec::new();
    let mut skipped = 0;
    loop {
        match events.try_recv() {
            Ok(event) => drained.push(event),
            Err(TryRecvError::Lagged(n)) => skipped += n,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    (drained, skipped)
}

async fn run_command(session: &GameSession, line: &str) -> anyhow::Result<bool> {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match cmd {
        "" => {}
        "help" => println!("{HELP}"),
        "click" => {
            let n: u32 = if rest.is_empty() {
                1
            } else {
                rest.parse().context("click count must be a number")?
            };
            let mut last = None;
            for _ in 0..n {
                last = Some(session.click());
            }
            if let Some(outcome) = last {
                print(&outcome)?;
            }
        }
        "daily" => report(session.claim_daily_reward().await)?,
        "gems" => report(session.claim_daily_gems().await)?,
        "box" => {
            let kind = match rest {
                "daily" | "" => BoxKind::Daily,
                "premium" => BoxKind::Premium,
                other => bail!("unknown box kind: {other}"),
            };
            report(session.open_box(kind).await)?;
        }
        "buy" => report(session.purchase_collectible(rest).await)?,
        "equip" => report(session.select_collectible(rest).await)?,
        "theme" => match rest.split_once(' ') {
            Some(("buy", id)) => report(session.purchase_theme(id.trim()).await)?,
            Some(("use", id)) => report(session.select_theme(id.trim()).await)?,
            _ => bail!("usage: theme buy|use <id>"),
        },
        "say" => report(session.send_message(rest).await)?,
        "nick" => report(session.update_nickname(rest).await)?,
        "tier" => {
            let level: u8 = rest.parse().context("tier must be a number")?;
            report(session.update_tier(level).await)?;
        }
        "top" => match session.leaderboard().await {
            Some(entries) => print(&entries)?,
            None => println!("leaderboard is not available offline"),
        },
        "stats" => print(&session.stats_summary())?,
        "state" => print(&session.snapshot())?,
        "quit" | "exit" => return Ok(false),
        other => bail!("unknown command: {other} (try `help`)"),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    tracing::info!(?config, "Loaded configuration");

    let session = GameSession::start(&config).await.context("failed to start session")?;
    let mut events = session.subscribe();

    let snapshot = session.snapshot();
    println!(
        "{} as {} [{}] ({:?} mode). Type `help` for commands.",
        APP_NAME,
        snapshot.profile.user.nickname,
        snapshot.profile.id().short(),
        snapshot.mode
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "events" {
            let (drained, skipped) = drain_events(&mut events);
            if skipped > 0 {
                println!("({skipped} older events skipped)");
            }
            for event in &drained {
                print(event)?;
            }
            continue;
        }
        match run_command(&session, line).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("error: {e:#}"),
        }
    }

    session.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast;

    use super::*;

    #[test]
    fn draining_continues_past_a_lag() {
        let (tx, mut rx) = broadcast::channel(2);
        for total in 1..=5 {
            tx.send(SessionEvent::GlobalTotalChanged { total }).unwrap();
        }

        let (drained, skipped) = drain_events(&mut rx);
        assert_eq!(skipped, 3);
        assert_eq!(
            drained,
            vec![
                SessionEvent::GlobalTotalChanged { total: 4 },
                SessionEvent::GlobalTotalChanged { total: 5 },
            ]
        );
        assert_eq!(drain_events(&mut rx), (Vec::new(), 0));
    }
}
