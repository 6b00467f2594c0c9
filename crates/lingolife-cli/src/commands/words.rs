//! The `lingolife words` and `lingolife add` commands.

use anyhow::Result;
use comfy_table::{presets, Cell, Table};

use lingolife_core::model::{Word, WordDraft};
use lingolife_core::traits::WordRepository;

use super::ClientContext;

pub async fn list(ctx: &ClientContext, json: bool) -> Result<()> {
    let (client, user) = ctx.client()?;
    let words = client.list_words(&user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&words)?);
        return Ok(());
    }
    if words.is_empty() {
        println!("No words yet. Add one with `lingolife add` or `lingolife lookup --save`.");
        return Ok(());
    }
    println!("{}", words_table(&words));
    println!("{} word(s)", words.len());
    Ok(())
}

pub async fn add(ctx: &ClientContext, draft: WordDraft) -> Result<()> {
    let (client, user) = ctx.client()?;
    let word = client.create_word(&user, draft).await?;
    println!("Added \"{}\" (id {})", word.term, word.id);
    Ok(())
}

fn words_table(words: &[Word]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["Term", "Phonetic", "Translation", "POS", "Known", "Unknown", "Last reviewed"]);
    for w in words {
        table.add_row(vec![
            Cell::new(&w.term),
            Cell::new(w.phonetic.as_deref().unwrap_or("")),
            Cell::new(&w.translation),
            Cell::new(w.part_of_speech.as_deref().unwrap_or("")),
            Cell::new(w.known_count),
            Cell::new(w.unknown_count),
            Cell::new(
                w.last_reviewed_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".into()),
            ),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use lingolife_core::model::UserId;

    use super::*;

    #[test]
    fn table_lists_every_word() {
        let user = UserId::from("u");
        let words = vec![
            Word::from_draft("1".into(), &user, WordDraft::new("cat", "猫"), Utc::now()),
            Word::from_draft(
                "2".into(),
                &user,
                WordDraft::new("dog", "狗").with_phonetic("/dɒɡ/"),
                Utc::now(),
            ),
        ];
        let rendered = words_table(&words).to_string();
        assert!(rendered.contains("cat"));
        assert!(rendered.contains("/dɒɡ/"));
        assert!(rendered.contains("never"));
    }
}
