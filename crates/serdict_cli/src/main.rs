use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serdict_core::core_api::{DEFAULT_DICT_FIELD, Editor, EditorOptions};
use serdict_core::field_tree::ValueField;
use tracing::{Level, info};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Dotted path from the base field to the dictionary node.
    #[arg(long = "dict-field", global = true, default_value = DEFAULT_DICT_FIELD)]
    dict_field: String,
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the dictionary's entries as a JSON object.
    Export {
        #[arg(value_name = "TREE.json")]
        tree: PathBuf,
        /// Defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Rebuild the dictionary from an edited JSON object.
    Import {
        #[arg(value_name = "TREE.json")]
        tree: PathBuf,
        #[arg(value_name = "DICT.json")]
        json: PathBuf,
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .without_time()
        .init();

    let editor = Editor::with_options(EditorOptions {
        dict_field: cli.dict_field.clone(),
    });

    match &cli.command {
        Command::Export { tree, output } => run_export(&editor, tree, output.as_deref()),
        Command::Import { tree, json, output } => run_import(&editor, tree, json, output),
    }
}

fn run_export(editor: &Editor, tree_path: &Path, output: Option<&Path>) {
    let tree = load_tree(tree_path);

    match output {
        Some(out_path) => {
            let summary = editor.export_to_path(&tree, out_path).unwrap_or_else(|e| {
                eprintln!("Error exporting dictionary to {}: {e}", out_path.display());
                process::exit(1);
            });
            info!(
                exported = summary.exported,
                unused = summary.unused_slots,
                path = %out_path.display(),
                "export complete"
            );
        }
        None => {
            let json = editor.export_json(&tree).unwrap_or_else(|e| {
                eprintln!("Error exporting dictionary: {e}");
                process::exit(1);
            });
            let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
                eprintln!("Error rendering JSON output: {e}");
                process::exit(1);
            });
            println!("{rendered}");
        }
    }
}

fn run_import(editor: &Editor, tree_path: &Path, json_path: &Path, output: &Path) {
    let mut tree = load_tree(tree_path);

    let summary = editor
        .import_from_path(&mut tree, json_path)
        .unwrap_or_else(|e| {
            eprintln!("Error importing {}: {e}", json_path.display());
            process::exit(1);
        });

    save_tree(&tree, output).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {e}", output.display());
        process::exit(1);
    });

    info!(
        count = summary.count,
        capacity = summary.capacity,
        skipped = summary.skipped_sentinels,
        path = %output.display(),
        "import complete"
    );
}

fn load_tree(path: &Path) -> ValueField {
    let file = File::open(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    serde_json::from_reader(BufReader::new(file)).unwrap_or_else(|e| {
        eprintln!("Error parsing field tree: {}", path.display());
        eprintln!("  {e}");
        process::exit(1);
    })
}

fn save_tree(tree: &ValueField, path: &Path) -> io::Result<()> {
    let rendered = serde_json::to_vec_pretty(tree).map_err(io::Error::other)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&rendered)?;
    writer.write_all(b"\n")?;
    writer.flush()
}
