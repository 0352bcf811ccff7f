use anyhow::{Context, Result, anyhow, bail};
use craftsy_config::Config;
use craftsy_engine::editing::slash_items;
use craftsy_engine::export::{a4_html, word_html};
use craftsy_engine::history::{Autosaver, Clock, FileStorage, Storage, VersionStore};
use craftsy_engine::{Cmd, Document, templates};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, process, thread};

const USAGE: &str = "Usage: craftsy <command> [args]

Document commands (FILE is a JSON document payload):
  outline FILE                 list headings with their positions
  blocks FILE                  list top-level blocks with drag positions
  move FILE FROM TO            move the block at FROM to the gap nearest TO
  delete FILE FROM TO          delete the range [FROM, TO)
  slash FILE FROM TO QUERY     run the first slash command matching QUERY on the typed range
  html FILE [--a4 TITLE | --word]
                               render to HTML, optionally wrapped for printing or .doc export
  template NAME FILE           write a starter document

History commands (stored under the configured storage directory):
  snapshot FILE [TITLE]        record a snapshot of FILE
  save FILE                    manual save: live document plus a snapshot
  autosave FILE                write the autosave slot if FILE changed
  watch FILE                   autosave FILE every configured interval until interrupted
  history                      list snapshots, newest first
  restore ID FILE              write snapshot ID to FILE
  forget ID                    delete snapshot ID
  clear-history                delete all snapshots";

#[derive(Debug, PartialEq)]
enum Command {
    Outline(PathBuf),
    Blocks(PathBuf),
    Move { file: PathBuf, from: usize, to: usize },
    Delete { file: PathBuf, from: usize, to: usize },
    Slash { file: PathBuf, from: usize, to: usize, query: String },
    Html { file: PathBuf, wrap: HtmlWrap },
    Template { name: String, file: PathBuf },
    Snapshot { file: PathBuf, title: Option<String> },
    Save(PathBuf),
    Autosave(PathBuf),
    Watch(PathBuf),
    History,
    Restore { id: String, file: PathBuf },
    Forget(String),
    ClearHistory,
}

#[derive(Debug, PartialEq)]
enum HtmlWrap {
    None,
    A4(String),
    Word,
}

fn parse_args(args: &[String]) -> Result<Command> {
    let (name, rest) = args.split_first().ok_or_else(|| anyhow!("no command given"))?;
    let arg = |index: usize, what: &str| -> Result<String> {
        rest.get(index)
            .cloned()
            .ok_or_else(|| anyhow!("`{name}` is missing its {what} argument"))
    };
    let pos = |index: usize, what: &str| -> Result<usize> {
        let raw = arg(index, what)?;
        raw.parse::<usize>()
            .with_context(|| format!("{what} must be a position, got `{raw}`"))
    };
    let file = || arg(0, "FILE").map(PathBuf::from);

    let command = match name.as_str() {
        "outline" => Command::Outline(file()?),
        "blocks" => Command::Blocks(file()?),
        "move" => Command::Move {
            file: file()?,
            from: pos(1, "FROM")?,
            to: pos(2, "TO")?,
        },
        "delete" => Command::Delete {
            file: file()?,
            from: pos(1, "FROM")?,
            to: pos(2, "TO")?,
        },
        "slash" => Command::Slash {
            file: file()?,
            from: pos(1, "FROM")?,
            to: pos(2, "TO")?,
            query: arg(3, "QUERY")?,
        },
        "html" => {
            let wrap = match rest.get(1).map(String::as_str) {
                None => HtmlWrap::None,
                Some("--a4") => HtmlWrap::A4(arg(2, "TITLE")?),
                Some("--word") => HtmlWrap::Word,
                Some(other) => bail!("unknown html option `{other}`"),
            };
            Command::Html { file: file()?, wrap }
        }
        "template" => Command::Template {
            name: arg(0, "NAME")?,
            file: arg(1, "FILE").map(PathBuf::from)?,
        },
        "snapshot" => Command::Snapshot {
            file: file()?,
            title: rest.get(1).cloned(),
        },
        "save" => Command::Save(file()?),
        "autosave" => Command::Autosave(file()?),
        "watch" => Command::Watch(file()?),
        "history" => Command::History,
        "restore" => Command::Restore {
            id: arg(0, "ID")?,
            file: arg(1, "FILE").map(PathBuf::from)?,
        },
        "forget" => Command::Forget(arg(0, "ID")?),
        "clear-history" => Command::ClearHistory,
        other => bail!("unknown command `{other}`"),
    };
    Ok(command)
}

fn read_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Document::from_bytes(&bytes).with_context(|| format!("parsing {}", path.display()))
}

fn write_document(path: &Path, doc: &Document) -> Result<()> {
    fs::write(path, doc.to_bytes()?).with_context(|| format!("writing {}", path.display()))
}

/// Apply `cmd` to the document in `path`, writing it back if anything changed.
fn edit(path: &Path, cmd: Cmd) -> Result<()> {
    let mut doc = read_document(path)?;
    let patch = doc.apply(cmd)?;
    if patch.is_applied() {
        write_document(path, &doc)?;
        println!("applied (version {})", patch.version);
    } else {
        println!("nothing to do");
    }
    Ok(())
}

fn open_store(config: &Config) -> VersionStore<FileStorage> {
    VersionStore::new(FileStorage::new(&config.storage_dir)).with_limit(config.history_limit)
}

/// Autosave `path` if the autosaver's interval has elapsed at `now_ms`.
fn autosave_pass<S: Storage, C: Clock>(
    autosaver: &mut Autosaver,
    store: &mut VersionStore<S, C>,
    path: &Path,
    now_ms: u64,
) -> Result<bool> {
    if !autosaver.is_due(now_ms) {
        return Ok(false);
    }
    let doc = read_document(path)?;
    Ok(autosaver.tick(now_ms, doc.root(), store)?)
}

fn watch(path: &Path, config: &Config) -> Result<()> {
    let mut store = open_store(config);
    let mut autosaver = Autosaver::new(config.autosave_interval_ms, 0);
    log::info!(
        "autosaving {} every {} ms",
        path.display(),
        autosaver.interval_ms()
    );
    loop {
        let now = store.clock().now_millis();
        if autosave_pass(&mut autosaver, &mut store, path, now)? {
            log::info!("autosaved {}", path.display());
        }
        thread::sleep(Duration::from_millis(autosaver.interval_ms().max(1)));
    }
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Outline(file) => {
            let doc = read_document(&file)?;
            for entry in doc.outline() {
                let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
                println!("{indent}{} @{}", entry.text, entry.position);
            }
        }
        Command::Blocks(file) => {
            let doc = read_document(&file)?;
            for handle in doc.block_handles() {
                println!(
                    "{:>6}..{:<6} {}",
                    handle.pos,
                    handle.end(),
                    handle.node_type.name()
                );
            }
        }
        Command::Move { file, from, to } => edit(&file, Cmd::MoveBlock { from, to })?,
        Command::Delete { file, from, to } => edit(&file, Cmd::DeleteRange { range: from..to })?,
        Command::Slash {
            file,
            from,
            to,
            query,
        } => {
            let item = slash_items(&query)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("no slash command matches `{query}`"))?;
            log::info!("running slash command `{}`", item.title);
            edit(
                &file,
                Cmd::Slash {
                    range: from..to,
                    command: item.command,
                },
            )?;
        }
        Command::Html { file, wrap } => {
            let body = read_document(&file)?.root().to_html();
            let page = match wrap {
                HtmlWrap::None => body,
                HtmlWrap::A4(title) => a4_html(&title, &body, "", ""),
                HtmlWrap::Word => word_html(&body, "", ""),
            };
            println!("{page}");
        }
        Command::Template { name, file } => {
            let root = templates::template(&name).ok_or_else(|| {
                anyhow!(
                    "unknown template `{name}`, expected one of: {}",
                    templates::template_names().join(", ")
                )
            })?;
            write_document(&file, &Document::from_node(root)?)?;
        }
        Command::Snapshot { file, title } => {
            let doc = read_document(&file)?;
            let snapshot = open_store(config).create(doc.root(), title.as_deref())?;
            println!("{} {}", snapshot.id, snapshot.title);
        }
        Command::Save(file) => {
            let doc = read_document(&file)?;
            let snapshot = open_store(config).save_document(doc.root())?;
            println!("{} {}", snapshot.id, snapshot.title);
        }
        Command::Autosave(file) => {
            let doc = read_document(&file)?;
            if open_store(config).autosave(doc.root())? {
                println!("autosaved");
            } else {
                println!("unchanged");
            }
        }
        Command::Watch(file) => watch(&file, config)?,
        Command::History => {
            for snapshot in open_store(config).list() {
                println!("{}  {}", snapshot.id, snapshot.title);
            }
        }
        Command::Restore { id, file } => {
            let root = open_store(config).restore(&id)?;
            write_document(&file, &Document::from_node(root)?)?;
        }
        Command::Forget(id) => open_store(config).delete(&id)?,
        Command::ClearHistory => open_store(config).clear()?,
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::debug!(
                "no config file at {}, using defaults",
                Config::config_path().display()
            );
            Config::default()
        }
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    log::debug!("storage directory: {}", config.storage_dir.display());

    run(command, &config)
}
