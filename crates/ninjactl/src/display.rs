//! Stats display for ninjactl.
//!
//! Text rendering builds strings so it can be tested; the `print_*`
//! wrappers write them to stdout.

use crate::ui::{colors, progress_bar, HR};
use ninja_common::progression::RANK_BANDS;
use ninja_common::{ProgressionState, Rank, SyncOutcome};
use serde::Serialize;
use std::fmt::Write;

/// Key column width
const KW: usize = 12;

/// Width of the XP bar
const BAR_WIDTH: usize = 30;

/// Machine-readable outcome of a `load`/`award`
#[derive(Debug, Serialize)]
pub struct OutcomeReport<'a> {
    pub user: &'a str,
    /// "authoritative", "fallback" or "ignored"
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'a ProgressionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_to_next_level: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<f64>,
}

impl<'a> OutcomeReport<'a> {
    pub fn new(user: &'a str, outcome: &'a SyncOutcome) -> Self {
        let source = match outcome {
            SyncOutcome::Authoritative(_) => "authoritative",
            SyncOutcome::Fallback(_) => "fallback",
            SyncOutcome::Ignored(_) => "ignored",
        };
        let state = outcome.state();
        Self {
            user,
            source,
            reason: outcome.ignored().map(|r| r.label()),
            state,
            xp_to_next_level: state.map(ProgressionState::xp_to_next_level),
            progress_percent: state.map(ProgressionState::progress_percent),
        }
    }
}

/// One line describing where the numbers came from
fn source_line(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Authoritative(_) => {
            format!("{}synced with progression service{}", colors::OK, colors::RESET)
        }
        SyncOutcome::Fallback(_) => format!(
            "{}service unreachable, showing local values{}",
            colors::WARN,
            colors::RESET
        ),
        SyncOutcome::Ignored(reason) => {
            format!("{}ignored: {}{}", colors::ERR, reason.label(), colors::RESET)
        }
    }
}

fn rank_color(rank: Rank) -> &'static str {
    match rank {
        Rank::Genin => colors::DIM,
        Rank::Chunin => colors::CYAN,
        Rank::Jonin => colors::OK,
        Rank::Kage => colors::HEADER,
    }
}

/// Render a user's progression block
pub fn render_state(user: &str, outcome: &SyncOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}{}{}", colors::BOLD, user, colors::RESET);
    let _ = writeln!(out, "  {}", source_line(outcome));

    let Some(state) = outcome.state() else {
        return out;
    };

    let kv = |out: &mut String, key: &str, value: String| {
        let _ = writeln!(out, "  {:KW$} {}", key, value);
    };

    kv(&mut out, "xp", state.xp.to_string());
    kv(&mut out, "level", state.level.to_string());
    kv(
        &mut out,
        "rank",
        format!("{}{}{}", rank_color(state.rank), state.rank, colors::RESET),
    );
    kv(
        &mut out,
        "next level",
        format!(
            "{} {:.1}% ({} XP to go)",
            progress_bar(state.progress_percent(), BAR_WIDTH),
            state.progress_percent(),
            state.xp_to_next_level()
        ),
    );
    kv(&mut out, "cash", format!("${}", state.virtual_cash));
    if let Some(synced) = state.last_synced {
        kv(&mut out, "synced", synced.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    }
    out
}

/// Banner shown once after a level-up
pub fn level_up_banner(state: &ProgressionState) -> String {
    format!(
        "{}{}LEVEL UP!{} You reached level {} ({})",
        colors::BOLD,
        colors::HEADER,
        colors::RESET,
        state.level,
        state.rank
    )
}

/// Table of rank bands
pub fn rank_table() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {:8} {:>10} {:>12}", "Rank", "Levels", "Starts at");
    let _ = writeln!(out, "  {}{}{}", colors::DIM, "-".repeat(32), colors::RESET);

    // Bands are stored highest first; show them lowest first
    let ranks: Vec<Rank> = RANK_BANDS.iter().rev().map(|&(_, rank)| rank).collect();
    for (i, rank) in ranks.iter().enumerate() {
        let min = rank.min_level();
        let levels = match ranks.get(i + 1) {
            Some(next) => format!("{}-{}", min, next.min_level().0.saturating_sub(1)),
            None => format!("{}+", min),
        };
        let _ = writeln!(
            out,
            "  {:8} {:>10} {:>9} XP",
            rank.as_str(),
            levels,
            min.xp_required()
        );
    }
    out
}

/// Level and rank for a raw XP total
pub fn render_level(xp: u64) -> String {
    let state = ProgressionState::from_xp(xp);
    format!(
        "  {:KW$} {}\n  {:KW$} {}\n  {:KW$} {}\n  {:KW$} {} ({} XP to go)\n",
        "xp",
        xp,
        "level",
        state.level,
        "rank",
        state.rank,
        "next level",
        state.xp_for_next_level(),
        state.xp_to_next_level()
    )
}

pub fn print_state(user: &str, outcome: &SyncOutcome) {
    print!("{}", render_state(user, outcome));
}

pub fn print_rule() {
    println!("{}{}{}", colors::DIM, HR, colors::RESET);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ninja_common::IgnoreReason;

    #[test]
    fn test_render_fallback_state() {
        let outcome = SyncOutcome::Fallback(ProgressionState::from_xp(1200));
        let text = render_state("u1", &outcome);
        assert!(text.contains("service unreachable"));
        assert!(text.contains("1200"));
        assert!(text.contains("Genin"));
        assert!(text.contains("400 XP to go"));
        assert!(!text.contains("synced "));
    }

    #[test]
    fn test_render_ignored() {
        let outcome = SyncOutcome::Ignored(IgnoreReason::MissingUser);
        let text = render_state("", &outcome);
        assert!(text.contains("ignored: no user identifier"));
        assert!(!text.contains("level"));
    }

    #[test]
    fn test_rank_table_order() {
        let table = rank_table();
        let genin = table.find("Genin").unwrap();
        let chunin = table.find("Chunin").unwrap();
        let kage = table.find("Kage").unwrap();
        assert!(genin < chunin && chunin < kage);
        assert!(table.contains("10-19"));
        assert!(table.contains("50+"));
        assert!(table.contains("0-9"));
        assert!(table.contains("20-49"));
        assert!(table.contains("10000 XP"));
        assert!(table.contains("250000 XP"));
    }

    #[test]
    fn test_render_level() {
        let text = render_level(25_000);
        assert!(text.contains("15"));
        assert!(text.contains("Chunin"));
        assert!(text.contains("25600"));
    }

    #[test]
    fn test_json_report() {
        let outcome = SyncOutcome::Authoritative(ProgressionState::from_xp(250));
        let json = serde_json::to_value(OutcomeReport::new("u1", &outcome)).unwrap();
        assert_eq!(json["source"], "authoritative");
        assert_eq!(json["state"]["xp"], 250);
        assert_eq!(json["state"]["rank"], "Genin");
        assert_eq!(json["xp_to_next_level"], 150);
        assert_eq!(json["progress_percent"], 50.0);
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn test_json_report_ignored() {
        let outcome = SyncOutcome::Ignored(IgnoreReason::SessionMismatch);
        let json = serde_json::to_value(OutcomeReport::new("u2", &outcome)).unwrap();
        assert_eq!(json["source"], "ignored");
        assert!(json.get("state").is_none());
    }

    #[test]
    fn test_level_up_banner() {
        let mut state = ProgressionState::from_xp(1600);
        state.just_leveled_up = true;
        assert!(level_up_banner(&state).contains("level 4 (Genin)"));
    }
}
