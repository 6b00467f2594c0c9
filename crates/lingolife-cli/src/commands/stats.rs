//! The `lingolife stats` command.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use comfy_table::{presets, Table};

use lingolife_core::review_log::DailyReviewLog;
use lingolife_core::statistics::{compute_stats, VocabularyStats};
use lingolife_core::traits::WordRepository;

use super::ClientContext;

pub async fn execute(ctx: &ClientContext, goal: u32, json: bool) -> Result<()> {
    let (client, user) = ctx.client()?;
    let words = client.list_words(&user).await?;

    let today = Local::now().date_naive();
    let log = DailyReviewLog::new(Arc::clone(&ctx.state));
    let reviewed_today = log.reviewed_on(today)?.len();
    let tally = log.tally_on(today)?;

    let stats = compute_stats(&words, reviewed_today, tally, goal);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats_table(&stats, goal));
    }
    Ok(())
}

fn stats_table(stats: &VocabularyStats, goal: u32) -> Table {
    let recall = stats
        .recall_rate()
        .map(|r| format!("{r:.1}%"))
        .unwrap_or_else(|| "-".into());

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(vec!["", "Value"]);
    table.add_row(vec!["Words".to_string(), stats.total_words.to_string()]);
    table.add_row(vec!["Reviewed at least once".to_string(), stats.reviewed_words.to_string()]);
    table.add_row(vec!["Known (all time)".to_string(), stats.total_known.to_string()]);
    table.add_row(vec!["Unknown (all time)".to_string(), stats.total_unknown.to_string()]);
    table.add_row(vec!["Recall rate".to_string(), recall]);
    table.add_row(vec![
        "Reviewed today".to_string(),
        format!("{} / {goal}", stats.today_count),
    ]);
    table.add_row(vec![
        "Today known / unknown".to_string(),
        format!("{} / {}", stats.today_known, stats.today_unknown),
    ]);
    table.add_row(vec!["Daily goal".to_string(), format!("{}%", stats.daily_goal_progress)]);
    table
}

#[cfg(test)]
mod tests {
    use lingolife_core::review_log::DailyTally;

    use super::*;

    #[test]
    fn table_shows_goal_progress() {
        let stats = compute_stats(&[], 4, DailyTally { known: 3, unknown: 1 }, 10);
        let rendered = stats_table(&stats, 10).to_string();
        assert!(rendered.contains("4 / 10"));
        assert!(rendered.contains("40%"));
        assert!(rendered.contains("3 / 1"));
    }
}
