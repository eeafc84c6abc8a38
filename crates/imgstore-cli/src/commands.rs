use std::fs::File;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use imgstore_store::{ImageManager, LocalImageManager, StoreConfig};
use imgstore_types::{extension_to_mimetype, Count, ImageId, ImageInfo};

use crate::cli::*;

const FALLBACK_MIMETYPE: &str = "application/octet-stream";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let mut store = LocalImageManager::open(&config)
        .with_context(|| format!("opening image store at {}", config.root.display()))?;
    let json = matches!(cli.format, OutputFormat::Json);

    match cli.command {
        Command::Add(args) => cmd_add(&mut store, args, json)?,
        Command::Get(args) => cmd_get(&store, &args.id, json)?,
        Command::Delete(args) => cmd_delete(&mut store, &args.id, json)?,
        Command::Prune => cmd_prune(&mut store, json)?,
        Command::List => cmd_list(&store, json)?,
        Command::Check => cmd_check(&store, json)?,
        Command::Refs(refs) => cmd_refs(&mut store, refs, json)?,
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn parse_id(raw: &str) -> anyhow::Result<ImageId> {
    raw.parse()
        .with_context(|| format!("{raw:?} is not an image id"))
}

fn guess_mimetype(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(extension_to_mimetype)
        .unwrap_or(FALLBACK_MIMETYPE)
}

fn cmd_add(store: &mut LocalImageManager, args: AddArgs, json: bool) -> anyhow::Result<()> {
    let mimetype = args
        .mimetype
        .unwrap_or_else(|| guess_mimetype(&args.file).to_string());
    let mut file = File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;

    let info = ImageInfo::new(mimetype);
    let id = store.add_image(&mut file, &info, Count::new(args.confirmed, args.unconfirmed))?;
    store.flush()?;

    let count = store.references().get(&id).unwrap_or_default();
    if json {
        println!("{}", serde_json::json!({ "id": id, "count": count }));
    } else {
        println!("{} {} {}", "✓".green().bold(), id.to_string().yellow(), count);
    }
    Ok(())
}

fn cmd_get(store: &LocalImageManager, raw: &str, json: bool) -> anyhow::Result<()> {
    let id = parse_id(raw)?;
    let uri = store.get_image(&id)?;
    if json {
        println!("{}", serde_json::json!({ "id": id, "uri": uri }));
    } else {
        println!("{uri}");
    }
    Ok(())
}

fn cmd_delete(store: &mut LocalImageManager, raw: &str, json: bool) -> anyhow::Result<()> {
    let id = parse_id(raw)?;
    let deleted = store.delete_image(&id)?;
    store.flush()?;
    if json {
        println!("{}", serde_json::json!({ "id": id, "deleted": deleted }));
    } else if deleted {
        println!("{} Deleted {}", "✓".green(), id.to_string().yellow());
    } else {
        println!(
            "{} No blob for {}; dropped its ledger entry",
            "!".yellow().bold(),
            id.to_string().yellow()
        );
    }
    Ok(())
}

fn cmd_prune(store: &mut LocalImageManager, json: bool) -> anyhow::Result<()> {
    let result = store.prune_images();
    // Deletions made before a failure are real; keep the ledger in step.
    store.flush()?;
    let removed = result?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("{} Prune: {} images removed.", "✓".green(), removed.to_string().bold());
    }
    Ok(())
}

fn cmd_list(store: &LocalImageManager, json: bool) -> anyhow::Result<()> {
    let ids = store.list_images()?;
    if json {
        let rows: Vec<_> = ids
            .iter()
            .map(|id| serde_json::json!({ "id": id, "count": store.references().get(id) }))
            .collect();
        println!("{}", serde_json::Value::Array(rows));
        return Ok(());
    }
    for id in &ids {
        match store.references().get(id) {
            Some(count) => println!("{}  {}", id.to_string().yellow(), count),
            None => println!("{}  {}", id.to_string().yellow(), "unreferenced".dimmed()),
        }
    }
    Ok(())
}

fn cmd_check(store: &LocalImageManager, json: bool) -> anyhow::Result<()> {
    let report = store.check()?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }
    if report.is_consistent() {
        println!("{} No issues.", "✓".green().bold());
        return Ok(());
    }
    for id in &report.orphaned_blobs {
        println!("  {} {}", "orphaned blob:".red(), id);
    }
    for id in &report.missing_blobs {
        println!("  {} {}", "missing blob:".red(), id);
    }
    for id in &report.stale_entries {
        println!("  {} {}", "stale entry:".yellow(), id);
    }
    println!("{} issues.", report.issue_count().to_string().bold());
    Ok(())
}

fn cmd_refs(store: &mut LocalImageManager, refs: RefsCommand, json: bool) -> anyhow::Result<()> {
    match refs {
        RefsCommand::Show { id: Some(raw) } => {
            let id = parse_id(&raw)?;
            let count = store
                .references()
                .get(&id)
                .with_context(|| format!("no ledger entry for {id}"))?;
            print_entries(&[(id, count)], json);
        }
        RefsCommand::Show { id: None } => {
            print_entries(&store.references().entries(), json);
        }
        RefsCommand::Set {
            id,
            confirmed,
            unconfirmed,
        } => {
            let id = parse_id(&id)?;
            store
                .references_mut()
                .set(id, Count::new(confirmed, unconfirmed));
            store.flush()?;
            print_entries(&[(id, Count::new(confirmed, unconfirmed))], json);
        }
        RefsCommand::Remove { id } => {
            let id = parse_id(&id)?;
            let last = store.references_mut().remove(&id)?;
            store.flush()?;
            if json {
                println!("{}", serde_json::json!({ "id": id, "removed": last }));
            } else {
                println!("{} Removed entry {} (was {})", "✓".green(), id.to_string().yellow(), last);
            }
        }
    }
    Ok(())
}

fn print_entries(entries: &[(ImageId, Count)], json: bool) {
    if json {
        let map: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(id, count)| (id.to_hex(), serde_json::json!(count)))
            .collect();
        println!("{}", serde_json::Value::Object(map));
        return;
    }
    for (id, count) in entries {
        let marker = if count.is_zero() {
            "prunable".dimmed().to_string()
        } else {
            String::new()
        };
        println!("{}  {}  {}", id.to_string().yellow(), count, marker);
    }
}
