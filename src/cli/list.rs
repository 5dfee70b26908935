//! One-shot listing commands. Threads and posts go through the same entity
//! list and pagination bar as the interactive pages.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use ratatui::text::Line;
use tracing::debug;

use crate::api::{ForumClient, Post, Thread};
use crate::config::Config;
use crate::session::SessionStore;
use crate::tui::components::lists::{EntityList, PaginationAction};
use crate::tui::sources::{PostSource, ThreadSource};
use crate::tui::Theme;
use crate::utils::text::{format, html, string};

const TEXT_WIDTH: usize = 78;

/// List boards
#[derive(Debug, Args)]
pub struct BoardsCommand {}

impl BoardsCommand {
    pub async fn execute(&self, client: &ForumClient) -> Result<()> {
        let envelope = client
            .list_boards()
            .await
            .context("Failed to fetch boards")?;

        if envelope.result.boards.is_empty() {
            println!("No boards");
            return Ok(());
        }

        for board in &envelope.result.boards {
            let mut line = format!("{:>6}  {}", board.id, board.name);
            if let Some(count) = board.thread_count {
                line.push_str(&format!(" ({})", format::count(count, "thread", "threads")));
            }
            println!("{}", line);
            if let Some(description) = board.description.as_deref().filter(|d| !d.is_empty()) {
                println!(
                    "        {}",
                    string::truncate(&string::normalize_whitespace(description), TEXT_WIDTH - 8)
                );
            }
        }
        Ok(())
    }
}

/// Print one page of threads from a board
#[derive(Debug, Args)]
pub struct ThreadsCommand {
    /// Board to list
    pub board_id: i64,

    /// 1-based page number
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,
}

impl ThreadsCommand {
    pub async fn execute(&self, client: &ForumClient, config: &Config) -> Result<()> {
        let list = EntityList::new(
            ThreadSource::new(client.clone(), self.board_id),
            thread_lines,
            SessionStore::new(),
        )
        .with_limit(config.page_size);

        print_page(list, self.page, "threads").await
    }
}

/// Print one page of posts from a thread
#[derive(Debug, Args)]
pub struct PostsCommand {
    /// Thread to list
    pub thread_id: i64,

    /// 1-based page number
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,
}

impl PostsCommand {
    pub async fn execute(&self, client: &ForumClient, config: &Config) -> Result<()> {
        let list = EntityList::new(
            PostSource::new(client.clone(), self.thread_id),
            post_lines,
            SessionStore::new(),
        )
        .with_limit(config.page_size);

        print_page(list, self.page, "posts").await
    }
}

/// Walk forward to `page` (or the last page) and print it between two bars
async fn print_page<T: Send + 'static>(mut list: EntityList<T>, page: u64, noun: &str) -> Result<()> {
    list.mount();
    list.settle().await;

    while list.is_current()
        && (list.state().page_number() as u64) < page
        && !list.state().is_last_page()
    {
        list.dispatch(PaginationAction::NextPage);
        list.settle().await;
    }

    // A failed search leaves the previous rows under the new offset
    if !list.is_current() {
        bail!("Failed to fetch {} page {}", noun, list.state().page_number());
    }
    debug!(page = list.state().page_number(), "printing page");

    if list.state().entities.is_empty() {
        println!("No {}", noun);
        return Ok(());
    }

    let bar = line_text(&list.pagination_bar().line(&Theme::default()));
    println!("{}", bar);
    println!();
    for lines in list.rendered_children() {
        for line in &lines {
            println!("{}", line_text(line));
        }
    }
    println!("{}", bar);
    Ok(())
}

fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

fn thread_lines(thread: &Thread, index: usize) -> Vec<Line<'static>> {
    let author = thread.author.as_ref().map_or("unknown", |a| a.label());
    let activity = thread.last_post_at.unwrap_or(thread.created_at);
    vec![
        Line::from(format!(
            "{:>4}. {} [#{}]",
            index,
            string::truncate(&thread.title, TEXT_WIDTH - 16),
            thread.id
        )),
        Line::from(format!(
            "      by {} · {} · {}",
            author,
            format::count(thread.post_count, "post", "posts"),
            format::relative_time(activity, Utc::now())
        )),
    ]
}

fn post_lines(post: &Post, index: usize) -> Vec<Line<'static>> {
    let author = post.author.as_ref().map_or("unknown", |a| a.label());
    let mut lines = vec![Line::from(format!(
        "#{} {} · {}",
        index,
        author,
        post.created_at.format("%Y-%m-%d %H:%M")
    ))];
    lines.extend(
        string::word_wrap(&html::to_plain_text(&post.body), TEXT_WIDTH - 2)
            .into_iter()
            .map(|line| Line::from(format!("  {}", line))),
    );
    lines.push(Line::default());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserSummary;
    use crate::tui::components::lists::{SearchOptions, SearchOutcome, SearchResult};
    use chrono::TimeZone;

    fn numbered(entity: &usize, index: usize) -> Vec<Line<'static>> {
        vec![Line::from(format!("#{} entity={}", index, entity))]
    }

    #[tokio::test]
    async fn test_failed_page_fetch_is_an_error() {
        let search = |options: SearchOptions| async move {
            if options.offset == 10 {
                return None;
            }
            let entities = (options.offset..options.offset + options.limit).collect();
            Some(SearchOutcome::new(SearchResult::new(entities, 50)))
        };
        let list = EntityList::new(search, numbered, SessionStore::new());

        let err = print_page(list, 2, "items").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch items page 2");
    }

    #[tokio::test]
    async fn test_failed_first_fetch_is_an_error() {
        let search = |_options: SearchOptions| async move { None::<SearchOutcome<usize>> };
        let list = EntityList::new(search, numbered, SessionStore::new());

        let err = print_page(list, 1, "items").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch items page 1");
    }

    #[tokio::test]
    async fn test_page_walk_stops_at_the_last_page() {
        let search = |options: SearchOptions| async move {
            let end = (options.offset + options.limit).min(25);
            Some(SearchOutcome::new(SearchResult::new((options.offset..end).collect(), 25)))
        };
        let list = EntityList::new(search, numbered, SessionStore::new());

        assert!(print_page(list, 9, "items").await.is_ok());
    }

    #[test]
    fn test_post_lines() {
        let post = Post {
            id: 1,
            thread_id: 2,
            author: Some(UserSummary {
                id: 3,
                username: "ash".to_string(),
                display_name: None,
            }),
            body: "<p>First reply</p>".to_string(),
            created_at: Utc.with_ymd_and_hms(2023, 5, 4, 9, 30, 0).unwrap(),
            updated_at: None,
        };

        let lines: Vec<String> = post_lines(&post, 31).iter().map(line_text).collect();
        assert_eq!(lines[0], "#31 ash · 2023-05-04 09:30");
        assert_eq!(lines[1], "  First reply");
        assert_eq!(lines.last().map(String::as_str), Some(""));
    }

    #[test]
    fn test_thread_lines() {
        let thread = Thread {
            id: 77,
            board_id: 1,
            title: "Release notes".to_string(),
            author: None,
            post_count: 4,
            created_at: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            last_post_at: None,
        };

        let lines: Vec<String> = thread_lines(&thread, 3).iter().map(line_text).collect();
        assert_eq!(lines[0], "   3. Release notes [#77]");
        assert_eq!(lines[1], "      by unknown · 4 posts · 2019-01-01");
    }
}
