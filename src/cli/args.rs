//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::RepoId;
use crate::wiki::{User, WikiRepo};

/// Wikistore - Git-backed wiki storage
#[derive(Parser, Debug)]
#[command(name = "wikistore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (overrides $WIKISTORE_CONFIG and the default locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Which repository's wiki to operate on.
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Owner (user or organization) of the repository
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repo: String,

    /// Numeric repository id; keys the working copy and the edit lock
    #[arg(long)]
    pub repo_id: i64,
}

impl RepoArgs {
    pub fn to_repo(&self) -> WikiRepo {
        WikiRepo::new(RepoId::new(self.repo_id), &self.owner, &self.repo)
    }
}

/// Identity recorded on the commit.
#[derive(Args, Debug, Clone)]
pub struct AuthorArgs {
    /// Author login name
    #[arg(long)]
    pub author_name: String,

    /// Author email
    #[arg(long)]
    pub author_email: String,

    /// Author full name, preferred over the login name when set
    #[arg(long)]
    pub author_full_name: Option<String>,
}

impl AuthorArgs {
    pub fn to_user(&self) -> User {
        let user = User::new(&self.author_name, &self.author_email);
        match &self.author_full_name {
            Some(full_name) => user.with_full_name(full_name),
            None => user,
        }
    }
}

/// Page content, given inline or read from a file.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ContentArgs {
    /// Page content
    #[arg(long)]
    pub content: Option<String>,

    /// Read page content from this file (`-` for stdin)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the wiki store for a repository
    Init {
        #[command(flatten)]
        target: RepoArgs,
    },

    /// Add a new page
    #[command(after_help = "\
EXAMPLES:
    wikistore add --owner alice --repo notes --repo-id 1 \\
        --author-name alice --author-email alice@example.com \\
        --title 'Getting Started' --content '# Hello'")]
    Add {
        #[command(flatten)]
        target: RepoArgs,

        #[command(flatten)]
        author: AuthorArgs,

        /// Page title
        #[arg(long)]
        title: String,

        #[command(flatten)]
        content: ContentArgs,

        /// Commit message (defaults to "Update page '<title>'")
        #[arg(long, short, default_value = "")]
        message: String,
    },

    /// Edit (and optionally rename) a page
    Edit {
        #[command(flatten)]
        target: RepoArgs,

        #[command(flatten)]
        author: AuthorArgs,

        /// Current page title
        #[arg(long)]
        old_title: String,

        /// New page title (defaults to the current title)
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        content: ContentArgs,

        /// Commit message (defaults to "Update page '<title>'")
        #[arg(long, short, default_value = "")]
        message: String,
    },

    /// Delete a page
    Delete {
        #[command(flatten)]
        target: RepoArgs,

        #[command(flatten)]
        author: AuthorArgs,

        /// Page title
        #[arg(long)]
        title: String,
    },

    /// List published pages
    List {
        #[command(flatten)]
        target: RepoArgs,
    },

    /// Print a published page
    Show {
        #[command(flatten)]
        target: RepoArgs,

        /// Page title or URL token
        #[arg(long)]
        title: String,
    },
}
