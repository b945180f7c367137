//! Command handlers for ninjactl.

use anyhow::{Context, Result};
use ninja_common::{
    FileXpCache, HttpProgressionService, NinjaConfig, OfflineService, ProgressionEngine,
    ProgressionService, SyncOutcome, XpCache,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::cli::{CacheAction, Commands, VERSION};
use crate::display::{self, OutcomeReport};
use crate::ui::{colors, print_footer, print_header, print_kv};

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub config: NinjaConfig,
    pub offline: bool,
    pub json: bool,
}

/// Build an engine from config: HTTP unless `offline`, file cache always
pub fn build_engine(config: &NinjaConfig, offline: bool) -> Result<ProgressionEngine> {
    let service: Arc<dyn ProgressionService> = if offline {
        Arc::new(OfflineService)
    } else {
        Arc::new(
            HttpProgressionService::new(&config.api)
                .with_context(|| format!("Cannot use API URL '{}'", config.api.base_url))?,
        )
    };
    let cache = Arc::new(FileXpCache::new(config.cache_path()));
    debug!(
        service = service.name(),
        cache = %cache.path().display(),
        "progression engine ready"
    );
    Ok(ProgressionEngine::new(service, cache))
}

/// Dispatch a parsed command
pub async fn run(ctx: &CommandContext, command: Commands) -> Result<()> {
    match command {
        Commands::Stats { user } => stats(ctx, &user).await,
        Commands::Award {
            user,
            amount,
            reason,
        } => award(ctx, &user, amount, &reason).await,
        Commands::Level { xp } => level(ctx, xp),
        Commands::Ranks => ranks(ctx),
        Commands::Cache { action } => {
            let cache = FileXpCache::new(ctx.config.cache_path());
            match action {
                CacheAction::Show { user } => cache_show(ctx, &cache, user.as_deref()),
                CacheAction::Set { user, xp } => cache_set(ctx, &cache, &user, xp),
            }
        }
        Commands::Config => show_config(ctx),
    }
}

fn emit(ctx: &CommandContext, user: &str, outcome: &SyncOutcome) -> Result<()> {
    if ctx.json {
        let report = OutcomeReport::new(user, outcome);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display::print_state(user, outcome);
    }
    Ok(())
}

/// Handle `stats`
pub async fn stats(ctx: &CommandContext, user: &str) -> Result<()> {
    let engine = build_engine(&ctx.config, ctx.offline)?;
    let outcome = engine.load(user).await;

    if !ctx.json {
        print_header("ninjactl", VERSION);
    }
    emit(ctx, user, &outcome)?;
    if !ctx.json {
        print_footer();
    }
    Ok(())
}

/// Handle `award`: load the user first so a fallback adds to known XP
pub async fn award(ctx: &CommandContext, user: &str, amount: u64, reason: &str) -> Result<()> {
    let engine = build_engine(&ctx.config, ctx.offline)?;
    let loaded = engine.load(user).await;
    if let Some(reason) = loaded.ignored() {
        debug!(user = %user, reason = reason.label(), "load before award was ignored");
    }

    let outcome = engine.award(user, amount, reason).await;

    if !ctx.json {
        print_header("ninjactl", VERSION);
    }
    emit(ctx, user, &outcome)?;
    if !ctx.json {
        if let Some(state) = outcome.state().filter(|s| s.just_leveled_up) {
            display::print_rule();
            println!("  {}", display::level_up_banner(state));
        }
        print_footer();
    }

    if outcome.state().is_some_and(|s| s.just_leveled_up) {
        engine.acknowledge_level_up();
    }
    Ok(())
}

/// Handle `level`: pure calculation, no service involved
pub fn level(ctx: &CommandContext, xp: u64) -> Result<()> {
    if ctx.json {
        let state = ninja_common::ProgressionState::from_xp(xp);
        let value = serde_json::json!({
            "xp": xp,
            "level": state.level,
            "rank": state.rank,
            "next_level_xp": state.xp_for_next_level(),
            "xp_to_next_level": state.xp_to_next_level(),
            "progress_percent": state.progress_percent(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", display::render_level(xp));
    }
    Ok(())
}

/// Handle `ranks`
pub fn ranks(ctx: &CommandContext) -> Result<()> {
    if ctx.json {
        let bands: Vec<_> = ninja_common::progression::RANK_BANDS
            .iter()
            .rev()
            .map(|(_, rank)| {
                let min = rank.min_level();
                serde_json::json!({
                    "rank": rank,
                    "min_level": min,
                    "min_xp": min.xp_required(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&bands)?);
    } else {
        print!("{}", display::rank_table());
    }
    Ok(())
}

/// Cached entries, optionally narrowed to one user
pub fn cache_entries(cache: &FileXpCache, user: Option<&str>) -> Result<BTreeMap<String, u64>> {
    match user {
        Some(user) => {
            let mut entries = BTreeMap::new();
            if let Some(xp) = cache.get(user)? {
                entries.insert(ninja_common::cache_key(user), xp);
            }
            Ok(entries)
        }
        None => Ok(cache.entries()?),
    }
}

/// Handle `cache show`
pub fn cache_show(ctx: &CommandContext, cache: &FileXpCache, user: Option<&str>) -> Result<()> {
    let entries = cache_entries(cache, user)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}{}{}", colors::DIM, cache.path().display(), colors::RESET);
    if entries.is_empty() {
        println!("  (empty)");
    }
    for (key, xp) in &entries {
        print_kv(key, &xp.to_string(), 20);
    }
    Ok(())
}

/// Handle `cache set`
pub fn cache_set(ctx: &CommandContext, cache: &FileXpCache, user: &str, xp: u64) -> Result<()> {
    if user.trim().is_empty() {
        anyhow::bail!("User identifier must not be empty");
    }
    cache
        .put(user, xp)
        .with_context(|| format!("Failed to write {}", cache.path().display()))?;

    if ctx.json {
        let entry = BTreeMap::from([(ninja_common::cache_key(user), xp)]);
        println!("{}", serde_json::to_string(&entry)?);
    } else {
        println!(
            "{}cached{} {} = {}",
            colors::OK,
            colors::RESET,
            ninja_common::cache_key(user),
            xp
        );
    }
    Ok(())
}

/// Handle `config`
pub fn show_config(ctx: &CommandContext) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        print!("{}", ctx.config.to_toml()?);
        println!(
            "{}# cache file: {}{}",
            colors::DIM,
            ctx.config.cache_path().display(),
            colors::RESET
        );
    }
    Ok(())
}
