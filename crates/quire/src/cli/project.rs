//! `init`, `tree`, `stats`, `save` and `recent` command handlers

use std::path::PathBuf;

use quire_core::document::DocumentType;
use quire_core::fs::{FileSystem, RealFileSystem};
use quire_core::path;
use quire_core::stats::{self, TextStats};
use quire_core::tree::{build_tree, format_tree};

use crate::cli::util::{self, CliStore};

/// Create a project and remember it as the most recent one
pub fn handle_init(
    store: &CliStore,
    name: &str,
    dir: Option<PathBuf>,
    empty: bool,
    author: Option<String>,
) -> bool {
    let Some(config) = util::load_config() else {
        return false;
    };
    let dir = dir.unwrap_or_else(|| config.default_project_dir.join(path::sanitize(name)));
    let author = author.or(config.default_author);

    match store.create(&dir, name, !empty, author.as_deref()) {
        Ok(project) => {
            util::remember_project(&project.path);
            println!("✓ Created project '{}'", project.name);
            println!("  {}", project.path.display());
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

/// Print the project tree, as text or JSON
pub fn handle_tree(store: &CliStore, project_override: Option<PathBuf>, json: bool) -> bool {
    let Some(project) = util::open_project(store, project_override) else {
        return false;
    };
    let tree = build_tree(&project);

    if json {
        match serde_json::to_string_pretty(&tree) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("✗ {}", e);
                return false;
            }
        }
    } else {
        print!("{}", format_tree(&tree));
    }
    true
}

fn print_text_stats(label: &str, stats: &TextStats) {
    println!(
        "{:<20} {:>8} words {:>9} chars {:>6} sentences {:>5} paragraphs",
        label, stats.words, stats.characters, stats.sentences, stats.paragraphs
    );
}

/// Print project totals and a per-bucket breakdown
pub fn handle_stats(store: &CliStore, project_override: Option<PathBuf>, json: bool) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    let dir = project.directory().to_path_buf();
    let totals = stats::aggregate(&mut project.documents, &RealFileSystem, &dir);

    if json {
        return match serde_json::to_string_pretty(&totals) {
            Ok(text) => {
                println!("{}", text);
                true
            }
            Err(e) => {
                eprintln!("✗ {}", e);
                false
            }
        };
    }

    println!("{}", project.name);
    for bucket in DocumentType::BUCKETS {
        let mut bucket_stats = TextStats::default();
        let mut count = 0;
        for doc in project
            .documents
            .iter_mut()
            .filter(|d| !d.is_trashed() && d.doc_type.bucket() == bucket)
        {
            bucket_stats += doc.stats(&RealFileSystem, &dir);
            count += 1;
        }
        if count > 0 {
            print_text_stats(&format!("  {} ({})", bucket.bucket_name(), count), &bucket_stats);
        }
    }
    print_text_stats(
        &format!("  Total ({})", totals.document_count),
        &totals.totals,
    );
    println!("  Manuscript words: {}", totals.manuscript_words);

    if let Some(target) = project.metadata.as_ref().and_then(|m| m.word_target)
        && target > 0
    {
        let percent = totals.manuscript_words as f64 * 100.0 / target as f64;
        println!("  Target: {} ({:.1}%)", target, percent);
    }
    true
}

/// Save the project, healing any file whose path drifted
pub fn handle_save(store: &CliStore, project_override: Option<PathBuf>) -> bool {
    let Some(mut project) = util::open_project(store, project_override) else {
        return false;
    };
    if util::save_project(store, &mut project) {
        println!("✓ Saved {}", project.path.display());
        true
    } else {
        false
    }
}

/// List recently opened projects, marking missing ones
pub fn handle_recent() -> bool {
    let Some(config) = util::load_config() else {
        return false;
    };
    if config.recent_projects.is_empty() {
        println!("No recent projects");
        return true;
    }
    for (i, project) in config.recent_projects.iter().enumerate() {
        let missing = if RealFileSystem.exists(project) {
            ""
        } else {
            " (missing)"
        };
        println!("{:>2}. {}{}", i + 1, project.display(), missing);
    }
    true
}
