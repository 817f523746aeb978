//! Interactive session driver
//!
//! Opens one gallery session over the images given on the command line and
//! drives it from stdin: `n` next, `p` previous, `g <index>` jump, `q` close.

use anyhow::{Context, Result};
use gallery_core::{
    Bounds, ContentState, EventSink, FsContentProvider, GalleryEvent, GalleryOptions,
    GallerySession, Item, ItemCollection, ItemKind, SessionRegistry, StaticStage, Viewport,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sink echoing lifecycle events to the log
struct LogSink;

impl EventSink for LogSink {
    fn on_event(&mut self, event: &GalleryEvent) {
        tracing::info!(?event, "Gallery event");
    }
}

pub fn run(paths: Vec<String>) -> Result<()> {
    let options = GalleryOptions::load().unwrap_or_default();

    let mut collection = ItemCollection::new(options);
    for path in &paths {
        collection.push(Item::new(ItemKind::Image, path.clone()));
    }

    let mut registry = SessionRegistry::new();
    let id = registry.allocate_id();
    let stage = Box::new(StaticStage::new(
        Bounds::new(0.0, 0.0, 1280.0, 720.0),
        Viewport::new(1280.0, 720.0, 1.0),
    ));
    let mut session = GallerySession::new(
        id,
        collection,
        stage,
        Arc::new(FsContentProvider::new()),
    )?;
    session.add_sink(Box::new(LogSink));
    registry.register(session);

    let session = registry.get_mut(id).context("session vanished")?;
    session.open_at(0, Instant::now());
    settle(session);
    print_slide(session);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let Some(session) = registry.get_mut(id) else {
            break;
        };
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("n") => {
                session.next(Instant::now());
            }
            Some("p") => {
                session.previous(Instant::now());
            }
            Some("g") => match parts.next().and_then(|s| s.parse::<i64>().ok()) {
                Some(position) => {
                    session.jump_to(position, None, Instant::now());
                }
                None => {
                    eprintln!("usage: g <position>");
                    continue;
                }
            },
            Some("q") | None => {
                session.close(None, Instant::now());
                settle_close(session);
                registry.reap();
                break;
            }
            Some(other) => {
                eprintln!("unknown command: {}", other);
                continue;
            }
        }

        settle(session);
        print_slide(session);
    }

    tracing::info!("Lumenbox exiting");
    Ok(())
}

/// Pump until the current slide completes or errors out
fn settle(session: &mut GallerySession) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        session.pump(Instant::now());
        if session.current_slide().is_some_and(|s| s.is_complete) {
            return;
        }
        std::thread::sleep(Duration::from_millis(8));
    }
    tracing::warn!("Slide did not complete in time");
}

fn settle_close(session: &mut GallerySession) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline && !session.is_finished() {
        session.pump(Instant::now());
        std::thread::sleep(Duration::from_millis(8));
    }
}

fn print_slide(session: &GallerySession) {
    let Some(slide) = session.current_slide() else {
        return;
    };
    let status = match slide.state {
        ContentState::Errored => "error",
        ContentState::Loaded => "ok",
        _ => "pending",
    };
    println!(
        "[{}] {} ({}x{}, {})",
        session.current_position(),
        slide.item.source,
        slide.width.unwrap_or(0.0),
        slide.height.unwrap_or(0.0),
        status
    );
}
