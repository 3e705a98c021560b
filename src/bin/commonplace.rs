use clap::{Parser, Subcommand};
use commonplace::config::EditorConfig;
use commonplace::logging::init_logging;
use commonplace::richtext::parser::parse_zettel;
use commonplace::richtext::serializer::serialize_doc;
use commonplace::richtext::{EditorCallbacks, default_functionalities};
use commonplace::store::{DirStore, ZettelStore, ZettelSummary, ZettelUpdate};
use commonplace::zettel::ZettelId;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "commonplace")]
#[command(about = "Zettel notes with a rich-text core", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the notes (overrides the config file)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Config file to use instead of the platform default
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a note and print its id
    New {
        /// Title of the new note
        #[arg(short, long, default_value = "")]
        title: String,
    },
    /// List all notes
    Ls,
    /// List notes whose title or text contains QUERY
    Search { query: String },
    /// Print a note's document tree
    Show { id: ZettelId },
    /// Check that a note parses and serializes back unchanged
    Check { id: ZettelId },
    /// Print a note as HTML
    Html { id: ZettelId },
    /// List the editor's key bindings
    Keys,
    /// List the editor's commands
    Commands,
}

fn print_summaries(summaries: &[ZettelSummary]) {
    for summary in summaries {
        let title = if summary.title.is_empty() {
            "(untitled)"
        } else {
            summary.title.as_str()
        };
        println!("{}  {}", summary.id, title);
    }
}

fn cmd_new(store: &DirStore, title: String) -> CliResult {
    let id = store.create()?;
    if !title.is_empty() {
        store.update(
            id,
            ZettelUpdate {
                title: Some(title),
                content: None,
            },
        )?;
    }
    println!("{}", id);
    Ok(())
}

fn cmd_show(store: &DirStore, config: &EditorConfig, id: ZettelId) -> CliResult {
    let zettel = store.fetch(id)?;
    let editor = default_functionalities(EditorCallbacks::default(), config.trigger).build()?;
    println!("# {}", zettel.title);
    match parse_zettel(editor.schema(), &zettel.content)? {
        Some(doc) => println!("{}", doc),
        None => println!("(empty)"),
    }
    Ok(())
}

fn cmd_check(store: &DirStore, config: &EditorConfig, id: ZettelId) -> CliResult {
    let zettel = store.fetch(id)?;
    let editor = default_functionalities(EditorCallbacks::default(), config.trigger).build()?;
    let round_trip = match parse_zettel(editor.schema(), &zettel.content)? {
        Some(doc) => serialize_doc(&doc)?,
        None => Vec::new(),
    };
    if round_trip != zettel.content {
        return Err(format!("zettel {} does not round-trip", id).into());
    }
    println!("zettel {}: ok ({} blocks)", id, zettel.content.len());
    Ok(())
}

fn cmd_html(store: &DirStore, config: &EditorConfig, id: ZettelId) -> CliResult {
    let zettel = store.fetch(id)?;
    let editor = default_functionalities(EditorCallbacks::default(), config.trigger).build()?;
    if let Some(doc) = parse_zettel(editor.schema(), &zettel.content)? {
        println!("{}", editor.schema().render_html(&doc));
    }
    Ok(())
}

fn cmd_keys(config: &EditorConfig) -> CliResult {
    let units = default_functionalities(EditorCallbacks::default(), config.trigger);
    let schema = Rc::new(units.schema()?);
    let keymap = units.keymap(&schema)?;
    for chord in keymap.chords() {
        println!("{:<16} {} binding(s)", chord.to_string(), keymap.commands(chord).len());
    }
    Ok(())
}

fn cmd_commands(config: &EditorConfig) -> CliResult {
    let editor = default_functionalities(EditorCallbacks::default(), config.trigger).build()?;
    for (name, entry) in editor.commands().iter() {
        if entry.is_parameterized() {
            println!("{} (takes arguments)", name);
        } else {
            println!("{}", name);
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match EditorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => EditorConfig::load_default(),
    };
    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("Warning: {}", e);
    }

    let Some(notes_dir) = args.dir.clone().or_else(|| config.notes_dir()) else {
        eprintln!("Error: no notes directory; pass --dir");
        std::process::exit(1);
    };
    let store = DirStore::new(notes_dir);

    let result = match args.command {
        Commands::New { title } => cmd_new(&store, title),
        Commands::Ls => store
            .list()
            .map(|summaries| print_summaries(&summaries))
            .map_err(Into::into),
        Commands::Search { query } => store
            .search(&query)
            .map(|summaries| print_summaries(&summaries))
            .map_err(Into::into),
        Commands::Show { id } => cmd_show(&store, &config, id),
        Commands::Check { id } => cmd_check(&store, &config, id),
        Commands::Html { id } => cmd_html(&store, &config, id),
        Commands::Keys => cmd_keys(&config),
        Commands::Commands => cmd_commands(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
