//! CLI module
//!
//! This module provides the command-line interface: running the reference
//! backend, printing the navigation tree and one-shot edits that go through a
//! full editing session (load, enter edit, mutate, save).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;

use crate::{
    api::{serve, ClientConfig, HttpGateway, MemoryGateway, ServerConfig},
    editor::{Editor, EditorConfig},
    models::{GroupKey, NavNode, NavTree},
    seed::seed_tree,
    session::SaveOutcome,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Navigation backend URL
    #[arg(
        short,
        long,
        env = "NAVEDIT_SERVER",
        default_value = "http://localhost:8081"
    )]
    server: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the reference navigation backend
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8081)]
        port: u16,

        /// Start with the seed navigation instead of an empty one
        #[arg(long)]
        seed: bool,
    },

    /// Print the navigation tree
    Tree,

    /// Move an item within one sibling group
    Move {
        /// Sibling group: "navigation-list" or "children-<parent id>"
        group: String,

        /// Current position of the item
        from: usize,

        /// Position to drop it at
        to: usize,
    },

    /// Make an item visible
    Show { id: String },

    /// Hide an item (it keeps its position)
    Hide { id: String },

    /// Flip an item's visibility
    Toggle { id: String },

    /// Rename an item
    Rename { id: String, title: String },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run the CLI application
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { port, seed } => {
            println!("Starting navedit backend on port {}...", port);

            let tree = if *seed { seed_tree() } else { NavTree::default() };
            let config = ServerConfig {
                address: ([127, 0, 0, 1], *port).into(),
            };

            serve(MemoryGateway::new(tree), config).await?;
            Ok(())
        }

        Commands::Tree => {
            let editor = load_editor(&cli).await?;
            print_editor(&editor);
            Ok(())
        }

        Commands::Move { group, from, to } => {
            let group: GroupKey = group.parse()?;
            edit(&cli, |editor| {
                match editor.move_item(&group, *from, *to)? {
                    Some(record) => println!(
                        "Moved {} from {} to {} in {}",
                        record.item_id, record.from_index, record.to_index, group
                    ),
                    None => println!("Nothing to move"),
                }
                Ok(())
            })
            .await
        }

        Commands::Show { id } => {
            edit(&cli, |editor| {
                report_edit(editor.set_visibility(id, true), id, "shown");
                Ok(())
            })
            .await
        }

        Commands::Hide { id } => {
            edit(&cli, |editor| {
                report_edit(editor.set_visibility(id, false), id, "hidden");
                Ok(())
            })
            .await
        }

        Commands::Toggle { id } => {
            edit(&cli, |editor| {
                report_edit(editor.toggle_visibility(id), id, "toggled");
                Ok(())
            })
            .await
        }

        Commands::Rename { id, title } => {
            edit(&cli, |editor| {
                report_edit(editor.set_title(id, title), id, "renamed");
                Ok(())
            })
            .await
        }

        Commands::Completions { shell } => {
            // Generate completions for the specified shell
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(())
        }
    }
}

async fn load_editor(cli: &Cli) -> Result<Editor, Box<dyn std::error::Error>> {
    let config = ClientConfig {
        base_url: cli.server.clone(),
        timeout: Duration::from_secs(cli.timeout),
    };
    let gateway = Arc::new(HttpGateway::with_config(config)?);

    Ok(Editor::load(gateway.clone(), gateway, EditorConfig::default()).await?)
}

/// Runs one edit inside a session and saves the result
async fn edit<F>(cli: &Cli, apply: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&Editor) -> Result<(), Box<dyn std::error::Error>>,
{
    let editor = load_editor(cli).await?;
    if let Some(notice) = editor.notice() {
        return Err(notice.into());
    }

    editor.enter_edit();
    apply(&editor)?;

    let outcome = editor.save().await;
    editor.flush_reports().await;

    match outcome {
        SaveOutcome::Saved => println!("{}", "Saved".green()),
        SaveOutcome::SavedOffline => {
            println!("{}", "Saved locally (backend unavailable)".yellow())
        }
        SaveOutcome::Failed(message) => return Err(message.into()),
        SaveOutcome::AlreadySaving => return Err("a save is already in progress".into()),
    }

    print_editor(&editor);
    Ok(())
}

fn report_edit(changed: bool, id: &str, verb: &str) {
    if changed {
        println!("Item {} {}", id, verb);
    } else {
        println!("No change for item {}", id);
    }
}

fn print_editor(editor: &Editor) {
    let snapshot = editor.snapshot();

    if snapshot.degraded {
        println!("{}", "offline demo mode".yellow());
    }
    if let Some(notice) = &snapshot.notice {
        println!("{}", notice.red());
    }

    print_tree(&snapshot.working);
}

fn print_tree(tree: &NavTree) {
    println!("Navigation ({}):", GroupKey::TopLevel);
    if tree.is_empty() {
        println!("  No items");
        return;
    }

    for (i, node) in tree.nodes().iter().enumerate() {
        print_node(node, i, 1);
        if let Some(children) = node.children() {
            println!(
                "{}({})",
                "  ".repeat(2),
                GroupKey::children_of(node.id()).to_string().dimmed()
            );
            for (j, child) in children.iter().enumerate() {
                print_node(child, j, 2);
            }
        }
    }
}

fn print_node(node: &NavNode, position: usize, depth: usize) {
    let line = format!(
        "{}{}. {} [{}] {}",
        "  ".repeat(depth),
        position,
        node.title(),
        node.id(),
        node.target()
    );

    if node.is_visible() {
        println!("{}", line);
    } else {
        println!("{} {}", line.dimmed(), "(hidden)".dimmed());
    }
}
