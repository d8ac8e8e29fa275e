//! Postwatch - live index over a directory of blog posts.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use postwatch::{
    cli::{Cli, Commands, QueryArgs},
    config::Config,
    index::{PostStore, QueryOptions},
    log,
    post::{PostId, PostRecord, generate_post_id},
    utils::date::{format_date, parse_date, parse_end_date},
    watch::watch_for_changes_blocking,
};
use serde::Serialize;
use std::{fs, sync::Arc};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    if let Commands::NewId = cli.command {
        let id = generate_post_id(config.content_dir())?;
        println!("{id}");
        return Ok(());
    }

    let store = PostStore::from_config(&config)
        .with_context(|| format!("Failed to index {}", config.content_dir().display()))?;

    match cli.command {
        Commands::Watch { .. } => {
            if !config.watch.enable {
                log!("watch"; "disabled by [watch.enable]");
            }
            watch_for_changes_blocking(Arc::new(store), &config.watch)
        }
        Commands::List { json } => print_posts(&store.posts_by_date(), json),
        Commands::Tags { search, json } => {
            let tags = store.tags_with_counts(search.as_deref().unwrap_or_default());
            if json {
                return print_json(&tags);
            }
            for tag in tags {
                println!("{:>4}  {}  {}", tag.count, tag.id, tag.name);
            }
            Ok(())
        }
        Commands::Query { query, json } => {
            let opts = query_options(query)?;
            print_posts(&store.query(&opts), json)
        }
        Commands::Search { term } => {
            for id in store.search_and_rank(&term) {
                if let Some(post) = store.get(&id) {
                    print_post_line(&post);
                }
            }
            Ok(())
        }
        Commands::Show { id } => {
            let id = PostId::parse(&id)?;
            let post = store.load(&id)?.ok_or_else(|| anyhow!("no post `{id}`"))?;
            println!("{}", post.meta.title);
            println!("{}", format_date(&post.meta.created_at));
            if !post.meta.tags.is_empty() {
                let tags: Vec<_> = post.meta.tags.iter().map(String::as_str).collect();
                println!("tags: {}", tags.join(", "));
            }
            if !post.attachments.is_empty() {
                let files: Vec<_> = post.attachments.iter().map(String::as_str).collect();
                println!("attachments: {}", files.join(", "));
            }
            println!();
            print!("{}", post.html);
            Ok(())
        }
        Commands::Remove { id, delete } => {
            let id = PostId::parse(&id)?;
            if !store.remove(&id, delete)? {
                bail!("no post `{id}`");
            }
            log!("index"; "removed {id}");
            Ok(())
        }
        Commands::Rename { old, new } => {
            let (old, new) = (PostId::parse(&old)?, PostId::parse(&new)?);
            if store.get(&old).is_none() {
                bail!("no post `{old}`");
            }
            let (from, to) = (store.post_dir(&old), store.post_dir(&new));
            if to.exists() {
                bail!("`{}` already exists", to.display());
            }
            fs::rename(&from, &to)
                .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))?;
            store.rename(&old, &new)?;
            log!("index"; "renamed {old} to {new}");
            Ok(())
        }
        Commands::Reconcile => {
            let report = store.reconcile()?;
            log!(
                "index";
                "{} indexed, {} removed, {} failed",
                report.indexed, report.removed, report.failed
            );
            Ok(())
        }
        Commands::NewId => Ok(()),
    }
}

/// Turn CLI filters into query options, parsing the date bounds.
fn query_options(args: QueryArgs) -> Result<QueryOptions> {
    let mut opts = QueryOptions::new();
    for tag in args.tags {
        opts = opts.tag(tag);
    }
    if let Some(after) = args.after {
        opts = opts.after(parse_date(&after).ok_or_else(|| anyhow!("invalid date `{after}`"))?);
    }
    if let Some(before) = args.before {
        opts = opts.before(parse_end_date(&before).ok_or_else(|| anyhow!("invalid date `{before}`"))?);
    }
    if let Some(search) = args.search {
        opts = opts.search(search);
    }
    Ok(opts)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_posts(posts: &[PostRecord], json: bool) -> Result<()> {
    if json {
        return print_json(posts);
    }
    posts.iter().for_each(print_post_line);
    Ok(())
}

fn print_post_line(post: &PostRecord) {
    let tags: Vec<_> = post.tags.iter().map(String::as_str).collect();
    println!(
        "{}  {:<17}  {}  [{}]",
        post.id,
        format_date(&post.created_at),
        post.title,
        tags.join(", ")
    );
}
