//! CLI probe for `prepnote_core`.
//!
//! # Responsibility
//! - Verify core linkage with deterministic output.
//! - Inspect a note store: list records or export one as a print page.

use clap::{Parser, Subcommand, ValueEnum};
use prepnote_core::{
    init_from_config, load_config, open_store_from_config, parse_html, render_print_page,
    Collection, CoreConfig, NoteLibrary, SqliteNoteStore, UserId,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "prepnote_cli")]
#[command(about = "Inspect PrepNote note stores", long_about = None)]
struct Args {
    /// JSON config file (store path, logging)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Store file; overrides `store_path` from the config
    #[arg(short = 's', long = "store", value_name = "FILE", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List saved notes, newest first
    List {
        /// Owner of the notes
        user: String,
        #[arg(value_enum)]
        collection: CollectionArg,
    },
    /// Export a saved note as a print page
    Export {
        /// Owner of the note
        user: String,
        #[arg(value_enum)]
        collection: CollectionArg,
        /// Document name
        name: String,
        /// Output HTML file
        out: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum CollectionArg {
    Usermade,
    Ainotes,
}

impl From<CollectionArg> for Collection {
    fn from(value: CollectionArg) -> Self {
        match value {
            CollectionArg::Usermade => Collection::UserMade,
            CollectionArg::Ainotes => Collection::AiNotes,
        }
    }
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let Some(command) = args.command else {
        println!("prepnote_core ping={}", prepnote_core::ping());
        println!("prepnote_core version={}", prepnote_core::core_version());
        return Ok(());
    };

    let config = resolve_config(args.config.as_deref(), args.store)?;
    init_from_config(&config)?;
    let conn = open_store_from_config(&config).map_err(|err| err.to_string())?;

    match command {
        Commands::List { user, collection } => {
            let library = NoteLibrary::with_user(SqliteNoteStore::new(&conn), user_id(user)?);
            for note in library
                .list(collection.into())
                .map_err(|err| err.to_string())?
            {
                println!("{}\t{}", note.saved_at.to_rfc3339(), note.name);
            }
            Ok(())
        }
        Commands::Export {
            user,
            collection,
            name,
            out,
        } => {
            let library = NoteLibrary::with_user(SqliteNoteStore::new(&conn), user_id(user)?);
            let note = library
                .load(collection.into(), &name)
                .map_err(|err| err.to_string())?
                .ok_or_else(|| format!("no note named `{name}`"))?;
            let page = render_print_page(&parse_html(&note.content), &note.name);
            std::fs::write(&out, page)
                .map_err(|err| format!("failed to write `{}`: {err}", out.display()))
        }
    }
}

/// Loads `config` when given; `store` replaces its `store_path`.
fn resolve_config(config: Option<&Path>, store: Option<PathBuf>) -> Result<CoreConfig, String> {
    let mut resolved = match config {
        Some(path) => load_config(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    if store.is_some() {
        resolved.store_path = store;
    }
    Ok(resolved)
}

fn user_id(user: String) -> Result<UserId, String> {
    UserId::new(user).ok_or_else(|| "user id cannot be blank".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn no_subcommand_prints_ping_and_version() {
        let args = Args::try_parse_from(["prepnote_cli"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn export_parses_collection_and_store() {
        let args = Args::try_parse_from([
            "prepnote_cli",
            "export",
            "u-1",
            "ainotes",
            "Graphs",
            "out.html",
            "--store",
            "notes.db",
        ])
        .unwrap();
        assert_eq!(args.store, Some(PathBuf::from("notes.db")));
        match args.command {
            Some(Commands::Export {
                collection, name, ..
            }) => {
                assert_eq!(Collection::from(collection), Collection::AiNotes);
                assert_eq!(name, "Graphs");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_collection_is_rejected() {
        assert!(Args::try_parse_from(["prepnote_cli", "list", "u-1", "drafts"]).is_err());
    }

    #[test]
    fn store_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("prepnote.json");
        std::fs::write(&config_path, r#"{ "store_path": "/tmp/from-config.db" }"#).unwrap();

        let from_file = resolve_config(Some(&config_path), None).unwrap();
        assert_eq!(from_file.store_path, Some(PathBuf::from("/tmp/from-config.db")));

        let overridden =
            resolve_config(Some(&config_path), Some(PathBuf::from("cli.db"))).unwrap();
        assert_eq!(overridden.store_path, Some(PathBuf::from("cli.db")));
    }
}
