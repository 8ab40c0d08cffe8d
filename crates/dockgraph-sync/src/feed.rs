//! Line-oriented bus feeder.
//!
//! Publishes one bus message per JSON line, e.g. piped from
//! `docker events --format '{{json .}}'`. Runs on a plain thread because
//! reads block and `broadcast::Sender::send` does not.
//!
//! A broadcast channel overwrites its oldest entry when full, so the feeder
//! holds back while `capacity` messages are still unread. A slow store then
//! stalls the input instead of losing events.

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use tokio::sync::broadcast;

use dockgraph_core::BusMessage;

const FULL_BUS_POLL: Duration = Duration::from_millis(2);

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedStats {
    pub lines: u64,
    pub published: u64,
    pub rejected: u64,
}

/// Decode and publish every line until EOF or until no receiver is left.
///
/// `capacity` is the bus capacity; never more than that many messages are
/// left unread at once.
pub fn feed_lines<R: BufRead>(
    reader: R,
    tx: &broadcast::Sender<BusMessage>,
    capacity: usize,
) -> FeedStats {
    let capacity = capacity.max(1);
    let mut stats = FeedStats::default();

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read input, stopping feed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.lines += 1;

        match BusMessage::decode(line) {
            Ok(msg) => {
                while tx.len() >= capacity && tx.receiver_count() > 0 {
                    thread::sleep(FULL_BUS_POLL);
                }
                if tx.send(msg).is_err() {
                    tracing::warn!("No bus subscriber left, stopping feed");
                    break;
                }
                stats.published += 1;
            }
            Err(e) => {
                stats.rejected += 1;
                tracing::warn!(error = %e, "Skipping undecodable line");
            }
        }
    }

    stats
}
