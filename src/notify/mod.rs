//! Outbound notifications for new reviews and rating changes.
//!
//! "Do X": Tell humans what changed since the last run.
//!
//! Messages are rendered once into a channel-neutral [`Message`] and each
//! channel formats it its own way. Channels sit behind [`Notifier`], so the
//! pipeline never knows whether it is talking to a terminal or a webhook.

mod console;
mod teams;

pub use console::ConsoleNotifier;
pub use teams::TeamsNotifier;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::rating::{average_rating, stars};
use crate::repository::{RatingSnapshot, ReviewRecord};
use crate::reviews::Distribution;

/// Destination for pipeline notifications.
pub trait Notifier {
    /// One message per record, in order.
    fn notify_new_reviews(&self, reviews: &[ReviewRecord]) -> Result<()>;

    /// Only called when the distribution genuinely advanced.
    fn notify_snapshot(
        &self,
        current: &RatingSnapshot,
        previous: Option<&RatingSnapshot>,
    ) -> Result<()>;
}

/// Sends to every channel in order, stopping at the first failure.
#[derive(Default)]
pub struct Fanout {
    channels: Vec<Box<dyn Notifier>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Box<dyn Notifier>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

impl Notifier for Fanout {
    fn notify_new_reviews(&self, reviews: &[ReviewRecord]) -> Result<()> {
        for channel in &self.channels {
            channel.notify_new_reviews(reviews)?;
        }
        Ok(())
    }

    fn notify_snapshot(
        &self,
        current: &RatingSnapshot,
        previous: Option<&RatingSnapshot>,
    ) -> Result<()> {
        for channel in &self.channels {
            channel.notify_snapshot(current, previous)?;
        }
        Ok(())
    }
}

/// Channel-neutral notification body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    /// e.g. `Store (ios)`
    pub subtitle: String,
    /// e.g. `App (candy)`
    pub subject: String,
    pub blocks: Vec<Block>,
}

/// One line of a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Line(String),
}

impl Block {
    pub fn text(&self) -> &str {
        match self {
            Block::Heading(text) | Block::Line(text) => text,
        }
    }
}

const DATE_FORMAT: &str = "%d-%b-%Y";

fn format_date(at: &DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// Render one new review.
pub fn review_message(review: &ReviewRecord) -> Message {
    Message {
        title: "You have a new review!".to_string(),
        subtitle: format!("Store ({})", review.store),
        subject: format!("App ({})", review.app_name),
        blocks: vec![
            Block::Heading(review.title.clone()),
            Block::Line(format!("@{}", review.username)),
            Block::Line(format_date(&review.rated_at)),
            Block::Line(format!("Rating {}", stars(review.rating))),
            Block::Line(review.body.clone()),
        ],
    }
}

/// Render a distribution change, with the prior state when there was one.
pub fn snapshot_message(current: &RatingSnapshot, previous: Option<&RatingSnapshot>) -> Message {
    let mut blocks = vec![Block::Heading(format!(
        "Now {}",
        format_date(&current.created_at)
    ))];
    push_distribution(&mut blocks, &current.distribution);

    if let Some(previous) = previous.filter(|p| p.distribution.total > 0) {
        blocks.push(Block::Heading(format!(
            "Before {}",
            format_date(&previous.created_at)
        )));
        push_distribution(&mut blocks, &previous.distribution);
    }

    Message {
        title: "You have a new rating!".to_string(),
        subtitle: format!("Store ({})", current.store),
        subject: format!("App ({})", current.app_name),
        blocks,
    }
}

fn push_distribution(blocks: &mut Vec<Block>, distribution: &Distribution) {
    blocks.push(Block::Line(format!("Total reviews: {}", distribution.total)));
    blocks.push(Block::Line(format!(
        "Average rating: {:.2}",
        average_rating(distribution)
    )));
    for star in (1..=5).rev() {
        blocks.push(Block::Line(format!(
            "{}: {}%",
            stars(star),
            distribution.percentage(star)
        )));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use crate::reviews::Store;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub(crate) fn record() -> ReviewRecord {
        ReviewRecord {
            id: 1,
            app_name: "candy".into(),
            store: Store::Ios,
            username: "john".into(),
            title: "Great".into(),
            body: "Love it".into(),
            rating: 4,
            rated_at: Utc.with_ymd_and_hms(2021, 12, 2, 0, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub(crate) fn snapshot(id: i64, total: i64, day: u32) -> RatingSnapshot {
        RatingSnapshot {
            id,
            app_name: "candy".into(),
            store: Store::Android,
            distribution: Distribution::new(total, [10, 0, 0, 20, 70]),
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
        }
    }

    fn texts(message: &Message) -> Vec<&str> {
        message.blocks.iter().map(Block::text).collect()
    }

    #[test]
    fn test_review_message() {
        let message = review_message(&record());
        assert_eq!(message.title, "You have a new review!");
        assert_eq!(message.subtitle, "Store (ios)");
        assert_eq!(message.subject, "App (candy)");
        assert_eq!(
            texts(&message),
            vec!["Great", "@john", "02-Dec-2021", "Rating ★★★★☆", "Love it"]
        );
    }

    #[test]
    fn test_snapshot_message_without_previous() {
        let message = snapshot_message(&snapshot(1, 100, 5), None);
        let lines = texts(&message);

        assert_eq!(message.title, "You have a new rating!");
        assert_eq!(message.subtitle, "Store (android)");
        assert_eq!(lines[0], "Now 05-Mar-2024");
        assert_eq!(lines[1], "Total reviews: 100");
        assert_eq!(lines[2], "Average rating: 4.40");
        assert_eq!(lines[3], "★★★★★: 70%");
        assert_eq!(lines[7], "★☆☆☆☆: 10%");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_snapshot_message_with_previous() {
        let previous = snapshot(1, 90, 4);
        let message = snapshot_message(&snapshot(2, 100, 5), Some(&previous));
        let lines = texts(&message);

        assert_eq!(lines.len(), 16);
        assert_eq!(message.blocks[8], Block::Heading("Before 04-Mar-2024".into()));
        assert_eq!(lines[9], "Total reviews: 90");
    }

    #[test]
    fn test_snapshot_message_skips_empty_previous() {
        let previous = snapshot(1, 0, 4);
        let message = snapshot_message(&snapshot(2, 100, 5), Some(&previous));
        assert_eq!(message.blocks.len(), 8);
    }

    struct Recording {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl Notifier for Recording {
        fn notify_new_reviews(&self, reviews: &[ReviewRecord]) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("{}:reviews:{}", self.name, reviews.len()));
            if self.fail {
                return Err(Error::Notify {
                    channel: "recording",
                    reason: "down".into(),
                });
            }
            Ok(())
        }

        fn notify_snapshot(
            &self,
            current: &RatingSnapshot,
            _previous: Option<&RatingSnapshot>,
        ) -> Result<()> {
            self.log
                .borrow_mut()
                .push(format!("{}:snapshot:{}", self.name, current.id));
            Ok(())
        }
    }

    #[test]
    fn test_fanout_in_order() -> Result<()> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let fanout = Fanout::new()
            .with(Box::new(Recording {
                name: "a",
                log: Rc::clone(&log),
                fail: false,
            }))
            .with(Box::new(Recording {
                name: "b",
                log: Rc::clone(&log),
                fail: false,
            }));

        assert!(!fanout.is_empty());
        fanout.notify_new_reviews(&[record()])?;
        fanout.notify_snapshot(&snapshot(3, 10, 1), None)?;

        assert_eq!(
            *log.borrow(),
            vec!["a:reviews:1", "b:reviews:1", "a:snapshot:3", "b:snapshot:3"]
        );
        Ok(())
    }

    #[test]
    fn test_empty_fanout_is_a_no_op() -> Result<()> {
        let fanout = Fanout::new();
        assert!(fanout.is_empty());
        fanout.notify_new_reviews(&[record()])?;
        fanout.notify_snapshot(&snapshot(1, 10, 1), None)
    }

    #[test]
    fn test_fanout_stops_at_failure() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let fanout = Fanout::new()
            .with(Box::new(Recording {
                name: "a",
                log: Rc::clone(&log),
                fail: true,
            }))
            .with(Box::new(Recording {
                name: "b",
                log: Rc::clone(&log),
                fail: false,
            }));

        assert!(fanout.notify_new_reviews(&[record()]).is_err());
        assert_eq!(*log.borrow(), vec!["a:reviews:1"]);
    }
}
