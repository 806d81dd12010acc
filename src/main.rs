use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use journal_xml::config::{config_search_paths, get_config, save_config, Config};
use journal_xml::models::schema::{AuthorField, ARTICLE_FIELDS, JOURNAL_FIELDS, PUBDATE_FIELDS};
use journal_xml::models::{Author, Document, PublicationDate};
use journal_xml::session::{Layout, Session};
use journal_xml::ui::{self, Status};
use journal_xml::print_status;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Journal XML - Build journal article metadata and exchange it as XML
#[derive(Parser, Debug)]
#[command(name = "journal-xml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build journal article metadata and export it as XML", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// XML shape for workbook conversion
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LayoutArg {
    /// Journal schema (`<journal>` root), same as the form path
    Form,
    /// Workbook rows verbatim under `<article>`
    Sheet,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Form => Layout::Form,
            LayoutArg::Sheet => Layout::Sheet,
        }
    }
}

/// Section reset by `--clear`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ClearTarget {
    /// Everything
    All,
    /// Journal fields (publication dates are kept)
    Journal,
    /// Publication dates
    Dates,
    /// Article fields, abstracts included
    Article,
    /// All authors
    Authors,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new, empty document (optionally filled from a preset)
    New {
        /// Output file (default: <article title or Untitled_Article>.xml)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Journal preset to apply
        #[arg(long, short)]
        preset: Option<String>,

        /// Overwrite the output file if it exists
        #[arg(long, short)]
        force: bool,
    },

    /// Import a document, change it, and write it back
    #[command(alias = "e")]
    Edit {
        /// XML file to edit
        file: PathBuf,

        /// Write here instead of back to FILE
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Fill the journal section from a preset
        #[arg(long, short)]
        preset: Option<String>,

        /// Set a journal field (KEY=VALUE)
        #[arg(long = "journal", short = 'j', value_parser = parse_key_value)]
        journal: Vec<(String, String)>,

        /// Set an article field (KEY=VALUE)
        #[arg(long = "article", short = 'a', value_parser = parse_key_value)]
        article: Vec<(String, String)>,

        /// Read the abstract from a file
        #[arg(long)]
        abstract_file: Option<PathBuf>,

        /// Read the Persian abstract from a file
        #[arg(long)]
        abstract_fa_file: Option<PathBuf>,

        /// Append a publication date (TYPE,YEAR,MONTH,DAY)
        #[arg(long, value_parser = parse_date)]
        add_date: Vec<PublicationDate>,

        /// Append an author (KEY=VALUE,KEY=VALUE,...)
        #[arg(long, value_parser = parse_author)]
        add_author: Vec<Author>,

        /// Change fields of an existing author (N,KEY=VALUE,...), N counts from 1
        #[arg(long, value_parser = parse_author_update)]
        set_author: Vec<AuthorUpdate>,

        /// Remove the author at position N (counting from 1)
        #[arg(long)]
        remove_author: Vec<usize>,

        /// Reset a section before applying other changes
        #[arg(long, value_enum)]
        clear: Vec<ClearTarget>,
    },

    /// Print a document
    #[command(alias = "s")]
    Show {
        /// XML file to show
        file: PathBuf,

        /// Print as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Generate XML from an .xlsx workbook (Journal, Article and Author(s) sheets)
    #[command(alias = "c")]
    Convert {
        /// Workbook to read
        workbook: PathBuf,

        /// Output file (default: workbook name with .xml)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output layout (default from configuration)
        #[arg(long, short, value_enum)]
        layout: Option<LayoutArg>,
    },

    /// List schema field keys and labels
    Fields,

    /// List journal presets
    Presets,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Where to write (default: the user configuration directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

/// Changes requested by `edit`, applied in one pass by [`apply_edits`]
#[derive(Debug, Default)]
struct Edits {
    preset: Option<String>,
    journal: Vec<(String, String)>,
    article: Vec<(String, String)>,
    abstract_text: Option<String>,
    abstract_fa_text: Option<String>,
    add_date: Vec<PublicationDate>,
    add_author: Vec<Author>,
    set_author: Vec<AuthorUpdate>,
    remove_author: Vec<usize>,
    clear: Vec<ClearTarget>,
}

/// `--set-author` argument
#[derive(Debug, Clone, PartialEq, Eq)]
struct AuthorUpdate {
    position: usize,
    fields: Vec<(AuthorField, String)>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {:?}", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_date(s: &str) -> Result<PublicationDate, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [calendar, year, month, day] => Ok(PublicationDate::new(calendar, *year, *month, *day)),
        _ => Err(format!("expected TYPE,YEAR,MONTH,DAY, got {:?}", s)),
    }
}

/// Split `k=v,k=v` pairs. A segment without `=` belongs to the previous value,
/// so `affiliation=Dept. A, Univ. B` keeps its comma.
fn parse_author_fields(s: &str) -> Result<Vec<(AuthorField, String)>, String> {
    let mut fields: Vec<(AuthorField, String)> = Vec::new();
    for segment in s.split(',') {
        match segment.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                let field = AuthorField::from_key(key)
                    .ok_or_else(|| format!("unknown author field {:?}", key))?;
                fields.push((field, value.to_string()));
            }
            None => match fields.last_mut() {
                Some((_, value)) => {
                    value.push(',');
                    value.push_str(segment);
                }
                None if segment.trim().is_empty() => {}
                None => return Err(format!("expected KEY=VALUE, got {:?}", segment)),
            },
        }
    }
    Ok(fields)
}

fn parse_author(s: &str) -> Result<Author, String> {
    let mut author = Author::new();
    for (field, value) in parse_author_fields(s)? {
        author.set_text(field, &value);
    }
    Ok(author)
}

fn parse_author_update(s: &str) -> Result<AuthorUpdate, String> {
    let (position, rest) = s
        .split_once(',')
        .ok_or_else(|| format!("expected N,KEY=VALUE,..., got {:?}", s))?;
    let position = position
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| format!("author position must be a number from 1, got {:?}", position))?;
    Ok(AuthorUpdate {
        position,
        fields: parse_author_fields(rest)?,
    })
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("journal_xml={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        print_status!(Status::Error, format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {

    let config = get_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&cli, &config);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::New {
            output,
            preset,
            force,
        } => {
            let mut session = Session::new(config.session_options());
            if let Some(name) = preset {
                apply_preset(&config, session.document_mut(), &name)?;
            }
            let path = output.unwrap_or_else(|| session.default_output_path(Path::new(".")));
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            session.save(&path)?;
            if !cli.quiet {
                print_status!(Status::Success, format!("Created {}", path.display()));
            }
        }

        Commands::Edit {
            file,
            output,
            preset,
            journal,
            article,
            abstract_file,
            abstract_fa_file,
            add_date,
            add_author,
            set_author,
            remove_author,
            clear,
        } => {
            let edits = Edits {
                preset,
                journal,
                article,
                abstract_text: abstract_file.as_deref().map(read_text).transpose()?,
                abstract_fa_text: abstract_fa_file.as_deref().map(read_text).transpose()?,
                add_date,
                add_author,
                set_author,
                remove_author,
                clear,
            };

            let mut session = Session::new(config.session_options());
            session.open_xml(&file)?;
            apply_edits(session.document_mut(), edits, &config)?;

            let path = output.unwrap_or(file);
            session.save(&path)?;
            if !cli.quiet {
                print_status!(Status::Success, format!("Saved {}", path.display()));
            }
        }

        Commands::Show { file, json } => {
            let mut session = Session::new(config.session_options());
            session.open_xml(&file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.document())?);
            } else {
                if !cli.quiet {
                    print_status!(Status::Info, file.display());
                }
                ui::print_document(session.document());
            }
        }

        Commands::Convert {
            workbook,
            output,
            layout,
        } => {
            let mut options = config.session_options();
            if let Some(layout) = layout {
                options.layout = layout.into();
            }
            let mut session = Session::new(options);
            session.select_workbook(&workbook);
            let document = session.generate_from_workbook()?;
            let authors = document.author_count();
            if authors == 0 && !cli.quiet {
                print_status!(
                    Status::Warning,
                    format!("No authors found in {}", workbook.display())
                );
            }

            let dir = workbook.parent().unwrap_or(Path::new("."));
            let path = output.unwrap_or_else(|| session.default_output_path(dir));
            session.save(&path)?;
            if !cli.quiet {
                print_status!(
                    Status::Success,
                    format!(
                        "XML file generated and saved to: {} ({} author(s))",
                        path.display(),
                        authors
                    )
                );
            }
        }

        Commands::Fields => {
            ui::print_section("Journal");
            println!("{}", ui::schema_table(JOURNAL_FIELDS));
            ui::print_section("Publication Date");
            println!("{}", ui::schema_table(PUBDATE_FIELDS));
            ui::print_section("Article");
            println!("{}", ui::schema_table(ARTICLE_FIELDS));
            ui::print_section("Author");
            println!("{}", ui::author_schema_table());
        }

        Commands::Presets => {
            println!("{}", ui::presets_table(&config.preset_registry()));
        }

        Commands::Config { command } => match command {
            ConfigCommands::Init { path, force } => {
                let path = match path {
                    Some(path) => path,
                    None => config_search_paths()
                        .pop()
                        .context("No configuration directory available")?,
                };
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                save_config(&Config::default(), &path)?;
                if !cli.quiet {
                    print_status!(
                        Status::Success,
                        format!("Wrote configuration to {}", path.display())
                    );
                }
            }
            ConfigCommands::Show => {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        },

        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "journal-xml", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Apply `edit` changes to an imported document.
///
/// Author positions in `--set-author` and `--remove-author` refer to the
/// document as imported and are resolved before anything is cleared.
/// Unknown positions fail before the document is touched.
fn apply_edits(document: &mut Document, edits: Edits, config: &Config) -> Result<()> {
    let count = document.author_count();
    let author_at = |position: usize| {
        position
            .checked_sub(1)
            .and_then(|i| document.author_id_at(i))
            .with_context(|| format!("No author at position {} (document has {})", position, count))
    };
    let updates = edits
        .set_author
        .into_iter()
        .map(|update| author_at(update.position).map(|id| (id, update.fields)))
        .collect::<Result<Vec<_>>>()?;
    let removals = edits
        .remove_author
        .iter()
        .map(|&position| author_at(position))
        .collect::<Result<Vec<_>>>()?;

    for target in edits.clear {
        match target {
            ClearTarget::All => document.clear_all(),
            ClearTarget::Journal => document.clear_journal(),
            ClearTarget::Dates => document.replace_publication_dates(Vec::new()),
            ClearTarget::Article => document.clear_article(),
            ClearTarget::Authors => document.clear_authors(),
        }
    }
    if let Some(name) = edits.preset {
        apply_preset(config, document, &name)?;
    }
    for (key, value) in edits.journal {
        document.journal_mut().set(&key, value)?;
    }
    for (key, value) in edits.article {
        document.article_mut().set(&key, value)?;
    }
    if let Some(text) = edits.abstract_text {
        document.article_mut().set("abstract", text)?;
    }
    if let Some(text) = edits.abstract_fa_text {
        document.article_mut().set("abstract_fa", text)?;
    }

    for (id, fields) in updates {
        let Some(author) = document.author_mut(id) else {
            tracing::warn!("Author update skipped, the author was cleared");
            continue;
        };
        for (field, value) in &fields {
            author.set_text(*field, value);
        }
    }
    for id in removals {
        document.remove_author(id);
    }

    for date in edits.add_date {
        *document.add_publication_date() = date;
    }
    for author in edits.add_author {
        document.push_author(author);
    }
    Ok(())
}

fn apply_preset(config: &Config, document: &mut Document, name: &str) -> Result<()> {
    let registry = config.preset_registry();
    let Some(preset) = registry.get(name) else {
        let known: Vec<&str> = registry.iter().map(|p| p.name()).collect();
        bail!("Unknown preset {:?} (available: {})", name, known.join(", "));
    };
    document.apply_preset(preset);
    tracing::info!("Applied preset {}", preset.name());
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
