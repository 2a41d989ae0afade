//! Plain-text notifications on stdout.

use colored::Colorize;
use log::info;

use super::{review_message, snapshot_message, Message, Notifier};
use crate::error::Result;
use crate::repository::{RatingSnapshot, ReviewRecord};

/// Prints each message as a small text card.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }

    fn print(&self, message: &Message) {
        info!("Printing to console");
        for (idx, line) in render(message).iter().enumerate() {
            match idx {
                0 => println!("{}", line.bold().green()),
                1 => println!("{}", line.dimmed()),
                _ => println!("{}", line),
            }
        }
        println!();
    }
}

/// Uncoloured card text, one entry per printed line. Empty lines are dropped.
pub fn render(message: &Message) -> Vec<String> {
    let mut lines = vec![
        message.title.clone(),
        format!("{} | {}", message.subject, message.subtitle),
    ];
    lines.extend(
        message
            .blocks
            .iter()
            .map(|block| block.text().to_string())
            .filter(|line| !line.trim().is_empty()),
    );
    lines
}

impl Notifier for ConsoleNotifier {
    fn notify_new_reviews(&self, reviews: &[ReviewRecord]) -> Result<()> {
        for review in reviews {
            self.print(&review_message(review));
        }
        Ok(())
    }

    fn notify_snapshot(
        &self,
        current: &RatingSnapshot,
        previous: Option<&RatingSnapshot>,
    ) -> Result<()> {
        self.print(&snapshot_message(current, previous));
        Ok(())
    }
}
