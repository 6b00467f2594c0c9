//! The `lingolife review` command: an interactive flashcard session.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use lingolife_core::model::Word;
use lingolife_core::review::{CardFace, ReviewEngine, SessionState};
use lingolife_core::review_log::DailyReviewLog;
use lingolife_core::traits::KeyValueStore;

use super::ClientContext;

pub async fn execute(ctx: &ClientContext) -> Result<()> {
    let (client, user) = ctx.client()?;
    let log = DailyReviewLog::new(Arc::clone(&ctx.state));
    let mut engine = ReviewEngine::new(Arc::new(client), log, user, Local::now().date_naive());

    let stdin = BufReader::new(tokio::io::stdin());
    run(&mut engine, stdin, &mut std::io::stdout()).await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Know,
    DontKnow,
    Restart,
    Quit,
    Other,
}

fn parse_key(line: &str) -> Key {
    match line.trim().to_ascii_lowercase().as_str() {
        "k" | "y" | "know" => Key::Know,
        "d" | "n" | "dont" | "don't" => Key::DontKnow,
        "r" | "restart" => Key::Restart,
        "q" | "quit" | "exit" => Key::Quit,
        _ => Key::Other,
    }
}

/// Drive a loaded-or-not engine from line input until the user quits or
/// input ends. Pending outcome writes are flushed before returning.
pub async fn run<K, R, W>(engine: &mut ReviewEngine<K>, input: R, out: &mut W) -> Result<()>
where
    K: KeyValueStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    if engine.session().state() == SessionState::Loading {
        engine.load().await?;
    }
    if engine.session().state() == SessionState::Empty {
        writeln!(out, "Nothing to review today. Add some words or come back tomorrow.")?;
        return Ok(());
    }

    let mut lines = input.lines();
    loop {
        prompt(engine, out)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let session = engine.session();
        match (session.state(), parse_key(&line)) {
            (_, Key::Quit) => break,
            (SessionState::Active, Key::Know) => {
                engine.know();
            }
            (SessionState::Active, Key::DontKnow) => {
                engine.dont_know();
            }
            (SessionState::Finished, Key::Restart) => engine.restart(),
            _ => writeln!(out, "?")?,
        }
    }

    let pending = engine.pending_writes();
    engine.flush().await;
    tracing::debug!(pending, "review outcomes flushed");
    Ok(())
}

fn prompt<K: KeyValueStore, W: Write>(engine: &ReviewEngine<K>, out: &mut W) -> Result<()> {
    let session = engine.session();
    if let Some(summary) = session.summary() {
        writeln!(out, "\nSession complete: {} card(s)", summary.total)?;
        writeln!(out, "  Known:   {}", summary.known)?;
        writeln!(out, "  Unknown: {}", summary.unknown)?;
        write!(out, "(r)estart, (q)uit > ")?;
        out.flush()?;
        return Ok(());
    }

    let Some(word) = session.current() else {
        return Ok(());
    };
    writeln!(
        out,
        "\n[{}/{}] {}%  {}",
        session.position() + 1,
        session.queue_len(),
        session.progress_percent(),
        front(word)
    )?;
    match session.face() {
        CardFace::Front => write!(out, "(k)now, (d)on't know, (q)uit > ")?,
        CardFace::Back => {
            write_back(word, out)?;
            write!(out, "(k) next, (q)uit > ")?;
        }
    }
    out.flush()?;
    Ok(())
}

fn front(word: &Word) -> String {
    match &word.phonetic {
        Some(p) => format!("{}  {p}", word.term),
        None => word.term.clone(),
    }
}

fn write_back<W: Write>(word: &Word, out: &mut W) -> Result<()> {
    match &word.part_of_speech {
        Some(pos) => writeln!(out, "  {pos}  {}", word.translation)?,
        None => writeln!(out, "  {}", word.translation)?,
    }
    if let Some(definition) = &word.definition {
        writeln!(out, "  {definition}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use lingolife_core::kv::MemoryKvStore;
    use lingolife_core::model::UserId;
    use lingolife_core::traits::WordRepository;
    use lingolife_store::InMemoryWordStore;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn engine(
        repo: Arc<InMemoryWordStore>,
        kv: Arc<MemoryKvStore>,
    ) -> ReviewEngine<Arc<MemoryKvStore>> {
        ReviewEngine::new(repo, DailyReviewLog::new(kv), UserId::default_user(), day())
    }

    #[test]
    fn keys() {
        assert_eq!(parse_key(" K "), Key::Know);
        assert_eq!(parse_key("d"), Key::DontKnow);
        assert_eq!(parse_key("quit"), Key::Quit);
        assert_eq!(parse_key("x"), Key::Other);
    }

    #[tokio::test]
    async fn full_session_persists_outcomes() {
        let repo = Arc::new(InMemoryWordStore::seeded());
        let kv = Arc::new(MemoryKvStore::new());
        let mut engine = engine(Arc::clone(&repo), Arc::clone(&kv));

        let mut out = Vec::new();
        run(&mut engine, &b"k\nd\nk\nq\n"[..], &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Session complete: 2 card(s)"));
        assert!(text.contains("Known:   1"));
        assert!(text.contains("Unknown: 1"));

        let words = repo.list_words(&UserId::default_user()).await.unwrap();
        let known: u32 = words.iter().map(|w| w.known_count).sum();
        let unknown: u32 = words.iter().map(|w| w.unknown_count).sum();
        assert_eq!((known, unknown), (5 + 3 + 1, 1 + 1));

        let log = DailyReviewLog::new(kv);
        assert_eq!(log.reviewed_on(day()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_session_same_day_is_empty() {
        let repo = Arc::new(InMemoryWordStore::seeded());
        let kv = Arc::new(MemoryKvStore::new());

        let mut first = engine(Arc::clone(&repo), Arc::clone(&kv));
        run(&mut first, &b"k\nk\n"[..], &mut Vec::new()).await.unwrap();

        let mut second = engine(repo, kv);
        let mut out = Vec::new();
        run(&mut second, &b""[..], &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Nothing to review today"));
    }

    #[tokio::test]
    async fn flipped_card_shows_translation() {
        let repo = Arc::new(InMemoryWordStore::seeded());
        let mut engine = engine(repo, Arc::new(MemoryKvStore::new()));

        let mut out = Vec::new();
        run(&mut engine, &b"d\nq\n"[..], &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("(k) next"));
        assert_eq!(engine.session().unknown_count(), 1);
    }
}
