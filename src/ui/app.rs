// Console front end
// Reads one command per line from stdin and prints search pages and queue
// changes to stdout. Logs go to stderr through tracing, so they don't mix
// with the listing.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::player::mixer::{MixOutcome, QueueMixer};
use crate::player::queue::{QueueEvent, QueueHandle};
use crate::search::{DurationFilter, PageOutcome, SearchAggregator};
use crate::youtube::duration::format_duration;
use crate::youtube::models::Candidate;

const HELP: &str = "Commands: /<query> search | filter all|min30|min60 | page <n> | play <n> | next | prev | move <from> <to> | queue | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Filter(DurationFilter),
    Page(u32),
    /// 1-based index into the current search page
    Play(usize),
    Next,
    Prev,
    /// 1-based queue positions
    Move(usize, usize),
    ShowQueue,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Some(query) = line.strip_prefix('/') {
        return Ok(Some(Command::Search(query.trim().to_string())));
    }

    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = match (verb.as_str(), args.as_slice()) {
        ("filter", [value]) => Command::Filter(value.parse()?),
        ("page", [n]) => Command::Page(parse_number(n)?),
        ("play", [n]) => Command::Play(parse_position(n)?),
        ("next" | "n", []) => Command::Next,
        ("prev" | "p", []) => Command::Prev,
        ("move", [from, to]) => Command::Move(parse_position(from)?, parse_position(to)?),
        ("queue" | "q", []) => Command::ShowQueue,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(format!("Unknown command: '{}'", line)),
    };
    Ok(Some(command))
}

fn parse_number<T: std::str::FromStr>(text: &str) -> std::result::Result<T, String> {
    text.parse().map_err(|_| format!("Not a number: '{}'", text))
}

fn parse_position(text: &str) -> std::result::Result<usize, String> {
    match parse_number::<usize>(text)? {
        0 => Err("Positions start at 1".to_string()),
        n => Ok(n),
    }
}

pub struct ConsoleApp {
    search: SearchAggregator,
    queue: Arc<QueueHandle>,
    mixer: Arc<QueueMixer>,
    filter: DurationFilter,
    search_results: Vec<Candidate>,
    should_quit: bool,
}

impl ConsoleApp {
    pub fn new(search: SearchAggregator, queue: Arc<QueueHandle>, mixer: Arc<QueueMixer>) -> Self {
        ConsoleApp {
            search,
            queue,
            mixer,
            filter: DurationFilter::All,
            search_results: Vec::new(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut events = self.queue.subscribe();
        println!("{}", HELP);

        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.handle_line(&line).await,
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(event) => self.show_event(event),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "queue events dropped"),
                    Err(RecvError::Closed) => break,
                },
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    async fn handle_line(&mut self, line: &str) {
        match parse_command(line) {
            Ok(Some(command)) => self.handle_command(command).await,
            Ok(None) => {}
            Err(message) => println!("{}", message),
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Search(query) => {
                let outcome = self.search.submit_query(&query, self.filter).await;
                self.show_page(outcome);
            }
            Command::Filter(filter) => {
                self.filter = filter;
                // No session yet just means the filter applies to the next search
                if self.search.session().await.is_some() {
                    let outcome = self.search.set_filter(filter).await;
                    self.show_page(outcome);
                } else {
                    println!("Filter: {}", filter);
                }
            }
            Command::Page(page) => {
                let outcome = self.search.request_page(page).await;
                self.show_page(outcome);
            }
            Command::Play(position) => self.play_result(position).await,
            Command::Next => {
                match self.queue.advance().await {
                    Some(item) => println!("Now playing: {}", describe(&item)),
                    None => println!("Queue is empty!"),
                }
                self.check_continuation();
            }
            Command::Prev => {
                match self.queue.previous().await {
                    Some(item) => println!("Now playing: {}", describe(&item)),
                    None => println!("Queue is empty!"),
                }
                self.check_continuation();
            }
            Command::Move(from, to) => {
                if !self.queue.move_item(from - 1, to - 1).await {
                    println!("No such queue position");
                }
            }
            Command::ShowQueue => self.show_queue().await,
            Command::Help => println!("{}", HELP),
            Command::Quit => self.should_quit = true,
        }
    }

    async fn play_result(&mut self, position: usize) {
        let Some(item) = self.search_results.get(position - 1).cloned() else {
            println!("No result #{} on this page", position);
            return;
        };

        self.queue
            .play_now(item.clone(), Some(self.search_results.clone()))
            .await;
        println!("Now playing: {}", describe(&item));

        let delay = self.mixer.settings().initial_delay();
        let handle = self.mixer.schedule_continuation(Arc::clone(&self.queue), delay);
        tokio::spawn(async move {
            if let Ok(outcome) = handle.await {
                log_outcome(outcome);
            }
        });
    }

    // Runs in the background; the mixer's own guard keeps overlapping checks harmless
    fn check_continuation(&self) {
        let mixer = Arc::clone(&self.mixer);
        let queue = Arc::clone(&self.queue);
        tokio::spawn(async move {
            let outcome = mixer.continue_if_needed(&queue).await;
            log_outcome(outcome);
        });
    }

    fn show_page(&mut self, outcome: crate::error::Result<PageOutcome>) {
        match outcome {
            Ok(PageOutcome::Page(view)) => {
                let more = if view.has_next { ", more available" } else { "" };
                let partial = if view.partial { " (filtered locally, search again for a full page)" } else { "" };
                println!("Page {}{}{}", view.page, more, partial);
                for (i, item) in view.results.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, describe(item));
                }
                self.search_results = view.results;
            }
            Ok(PageOutcome::Empty { page }) => {
                println!("Page {}: no results", page);
                self.search_results.clear();
            }
            // A newer request is on its way and will print itself
            Ok(PageOutcome::Superseded) => {}
            Err(e) => println!("Search failed: {}", e),
        }
    }

    async fn show_queue(&self) {
        let snapshot = self.queue.snapshot().await;
        if snapshot.is_empty() {
            println!("Queue is empty");
            return;
        }
        for (i, item) in snapshot.items().iter().enumerate() {
            let marker = if snapshot.current_index() == Some(i) { "▶" } else { " " };
            println!("{} {:>3}. {}", marker, i + 1, describe(item));
        }
        if self.queue.is_mixing() {
            println!("  (finding more...)");
        }
    }

    fn show_event(&self, event: QueueEvent) {
        match event {
            QueueEvent::Appended { added, len } => {
                println!("Added {} tracks to the queue ({} total)", added, len)
            }
            QueueEvent::Replaced { len, .. } => println!("Queue replaced ({} tracks)", len),
            QueueEvent::Reordered { .. } => println!("Queue reordered"),
            QueueEvent::CurrentChanged { current } => debug!(current, "current item changed"),
        }
    }
}

fn describe(item: &Candidate) -> String {
    if item.duration_seconds > 0 {
        format!(
            "{} - {} [{}]",
            item.title,
            item.channel_title,
            format_duration(item.duration_seconds)
        )
    } else {
        format!("{} - {}", item.title, item.channel_title)
    }
}

fn log_outcome(outcome: MixOutcome) {
    match outcome {
        MixOutcome::Appended(_) | MixOutcome::NotNeeded | MixOutcome::AlreadyInFlight => {}
        other => debug!(?other, "continuation finished without adding"),
    }
}
