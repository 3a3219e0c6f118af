//! cli::commands
//!
//! Command handlers. Each handler resolves its arguments, calls one
//! [`crate::wiki::Wiki`] operation, and prints the result.

use std::io::Read;

use anyhow::{bail, Context as _, Result};

use super::args::{Command, ContentArgs};
use super::Context;
use crate::wiki::{PageLookup, WikiOutcome};

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { target } => {
            let repo = target.to_repo();
            let wiki = ctx.service.wiki(&repo);
            if wiki.init_wiki()? {
                println!("Created wiki store at {}", wiki.wiki_path().display());
            } else {
                println!("Wiki store already exists at {}", wiki.wiki_path().display());
            }
            Ok(())
        }
        Command::Add {
            target,
            author,
            title,
            content,
            message,
        } => {
            let repo = target.to_repo();
            let content = read_content(&content)?;
            let outcome = ctx
                .service
                .wiki(&repo)
                .add_page(&author.to_user(), &title, &content, &message)
                .with_context(|| format!("failed to add page '{title}'"))?;
            report(&outcome);
            Ok(())
        }
        Command::Edit {
            target,
            author,
            old_title,
            title,
            content,
            message,
        } => {
            let repo = target.to_repo();
            let content = read_content(&content)?;
            let new_title = title.as_deref().unwrap_or(&old_title);
            let outcome = ctx
                .service
                .wiki(&repo)
                .edit_page(&author.to_user(), &old_title, new_title, &content, &message)
                .with_context(|| format!("failed to edit page '{old_title}'"))?;
            report(&outcome);
            Ok(())
        }
        Command::Delete {
            target,
            author,
            title,
        } => {
            let repo = target.to_repo();
            let outcome = ctx
                .service
                .wiki(&repo)
                .delete_page(&author.to_user(), &title)
                .with_context(|| format!("failed to delete page '{title}'"))?;
            report(&outcome);
            Ok(())
        }
        Command::List { target } => {
            let repo = target.to_repo();
            for page in ctx.service.wiki(&repo).pages()? {
                println!("{}\t{}", page.name, page.url_token());
            }
            Ok(())
        }
        Command::Show { target, title } => {
            let repo = target.to_repo();
            let wiki = ctx.service.wiki(&repo);
            let lookup = wiki.lookup_page(&title)?;
            if let PageLookup::Missing(page) = &lookup {
                bail!("page '{}' not found", page.name);
            }
            let content = wiki.page_content(&title)?.unwrap_or_default();
            print!("{content}");
            Ok(())
        }
    }
}

fn read_content(args: &ContentArgs) -> Result<String> {
    if let Some(content) = &args.content {
        return Ok(content.clone());
    }
    match args.file.as_deref() {
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read page content from stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => bail!("either --content or --file is required"),
    }
}

fn report(outcome: &WikiOutcome) {
    match outcome {
        WikiOutcome::Committed { oid } => println!("Published {}", oid.short(7)),
        WikiOutcome::Unchanged => println!("No changes"),
    }
}
