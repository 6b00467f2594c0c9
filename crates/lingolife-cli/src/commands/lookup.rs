//! The `lingolife lookup` command.

use anyhow::Result;

use lingolife_core::traits::{DictionaryEntry, EntrySource, WordRepository};

use super::ClientContext;

pub async fn execute(ctx: &ClientContext, term: &str, save: bool) -> Result<()> {
    let (client, user) = ctx.client()?;
    let entry = client.lookup(term).await?;
    print_entry(&entry);

    if save {
        if !entry.is_usable() {
            anyhow::bail!("nothing to save for \"{term}\"");
        }
        let word = client.create_word(&user, entry.to_draft()).await?;
        println!("\nSaved \"{}\" (id {})", word.term, word.id);
    }
    Ok(())
}

fn print_entry(entry: &DictionaryEntry) {
    if entry.phonetic.is_empty() {
        println!("{}", entry.term);
    } else {
        println!("{}  {}", entry.term, entry.phonetic);
    }
    if !entry.uk_phonetic.is_empty() || !entry.us_phonetic.is_empty() {
        println!("  UK {}  US {}", entry.uk_phonetic, entry.us_phonetic);
    }
    if !entry.part_of_speech.is_empty() {
        println!("  {}", entry.part_of_speech);
    }
    println!("  Translation: {}", entry.translation);
    if !entry.definition.is_empty() && entry.definition != entry.translation {
        println!("  Definition:  {}", entry.definition);
    }
    if !entry.examples.is_empty() {
        println!("  Web:");
        for example in &entry.examples {
            println!("    {}: {}", example.key, example.value.join("; "));
        }
    }
    if entry.source == EntrySource::Translation {
        println!("  (machine translation)");
    }
}
