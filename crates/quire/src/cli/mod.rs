//! Command dispatch for the `quire` binary

/// Clap argument definitions
mod args;

/// `cat` and `write` commands
mod content;

/// `init`, `tree`, `stats`, `save`, `recent` commands
mod project;

/// Structural edits: add, rename, move, reorder, rename-folder
mod structure;

/// Trash, restore and permanent deletion
mod trash;

/// Shared CLI utilities
mod util;

use clap::Parser;
use env_logger::Env;

use quire_core::fs::RealFileSystem;
use quire_core::store::ProjectStore;

pub use args::Cli;
use args::Commands;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = ProjectStore::new(RealFileSystem);
    let target = cli.project;

    // Execute commands and track success
    let success = match cli.command {
        Commands::Init {
            name,
            dir,
            empty,
            author,
        } => project::handle_init(&store, &name, dir, empty, author),

        Commands::Tree { json } => project::handle_tree(&store, target, json),

        Commands::Add {
            doc_type,
            title,
            parent,
            folder,
        } => structure::handle_add(&store, target, &doc_type, &title, parent, &folder),

        Commands::Rename {
            document,
            new_title,
        } => structure::handle_rename(&store, target, &document, &new_title),

        Commands::Move {
            document,
            parent,
            folder,
        } => structure::handle_move(&store, target, &document, parent, &folder),

        Commands::Reorder { document, index } => {
            structure::handle_reorder(&store, target, &document, index)
        }

        Commands::Trash { document } => trash::handle_trash(&store, target, &document),

        Commands::Restore {
            document,
            folder,
            parent,
        } => trash::handle_restore(&store, target, &document, folder, parent),

        Commands::Delete { document, yes } => {
            trash::handle_delete(&store, target, &document, yes)
        }

        Commands::EmptyTrash { yes } => trash::handle_empty_trash(&store, target, yes),

        Commands::RenameFolder {
            doc_type,
            folder,
            new_name,
        } => structure::handle_rename_folder(&store, target, &doc_type, &folder, &new_name),

        Commands::Stats { json } => project::handle_stats(&store, target, json),

        Commands::Cat { document } => content::handle_cat(&store, target, &document),

        Commands::Write { document } => content::handle_write(&store, target, &document),

        Commands::Save => project::handle_save(&store, target),

        Commands::Recent => project::handle_recent(),
    };

    if !success {
        std::process::exit(1);
    }
}
