use anyhow::{Context, Result};
use bookvault::catalog_store::BookFields;
use bookvault::{AssetStore, CatalogService, CatalogSession, PickedImage, SqliteCatalogStore, SqliteUserStore};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite database file (users and catalog).
    #[clap(value_parser = parse_path)]
    pub db_path: PathBuf,

    /// Directory for cover images. Defaults to the database's parent
    /// directory.
    #[clap(long, value_parser = parse_path)]
    pub assets_dir: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates a new account.
    Register { username: String, password: String },

    /// Opens a session; catalog commands require one.
    Login { username: String, password: String },

    /// Closes the current session.
    Logout,

    /// Lists all books with their genre titles.
    ListBooks,

    /// Lists all genres.
    ListGenres,

    /// Adds a genre.
    AddGenre { title: String },

    /// Adds a book, optionally with a cover image file.
    AddBook {
        title: String,
        author: String,
        #[clap(long)]
        year: Option<i32>,
        #[clap(long)]
        genre: Option<i64>,
        #[clap(long)]
        image: Option<PathBuf>,
    },

    /// Replaces all fields of a book. Without --image the previous cover
    /// is kept.
    UpdateBook {
        id: i64,
        title: String,
        author: String,
        #[clap(long)]
        year: Option<i32>,
        #[clap(long)]
        genre: Option<i64>,
        #[clap(long)]
        image: Option<PathBuf>,
    },

    /// Deletes a book.
    DeleteBook { id: i64 },

    /// Shows one book with its resolved cover image path.
    Show { id: i64 },

    /// Stores a new cover image for an existing book.
    AttachImage { id: i64, path: PathBuf },

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

fn read_picked_image(path: &Path) -> Result<PickedImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_string();
    Ok(PickedImage { bytes, extension })
}

fn make_fields(
    title: String,
    author: String,
    year: Option<i32>,
    genre: Option<i64>,
) -> BookFields {
    BookFields {
        title,
        author,
        year,
        genre,
        image_path: None,
    }
}

fn require_session<'a, 's>(
    session: &'s Option<CatalogSession<'a>>,
) -> Result<&'s CatalogSession<'a>, String> {
    session
        .as_ref()
        .ok_or_else(|| "Not logged in, use 'login <username> <password>' first.".to_string())
}

fn execute_command<'a>(
    line: &str,
    service: &'a CatalogService,
    session: &mut Option<CatalogSession<'a>>,
) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());
    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    let cli = match cli {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            return CommandExecutionResult::Ok;
        }
    };

    let outcome: Result<(), String> = match cli.command {
        InnerCommand::Register { username, password } => service
            .register(&username, &password)
            .map(|user_id| println!("Registered '{}' with id {}.", username.trim(), user_id))
            .map_err(|e| e.to_string()),

        InnerCommand::Login { username, password } => match service.login(&username, &password) {
            Ok(new_session) => {
                println!("Logged in as '{}'.", username.trim());
                *session = Some(new_session);
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        },

        InnerCommand::Logout => {
            *session = None;
            println!("Logged out.");
            Ok(())
        }

        InnerCommand::ListBooks => require_session(session).and_then(|session| {
            let books = session.list_books().map_err(|e| e.to_string())?;
            if books.is_empty() {
                println!("No books.");
            }
            for book in books {
                println!(
                    "{:>4}  {} - {} ({}) [{}]",
                    book.id,
                    book.title,
                    book.author,
                    book.year.map_or("-".to_string(), |y| y.to_string()),
                    book.genre_title.as_deref().unwrap_or("-"),
                );
            }
            Ok(())
        }),

        InnerCommand::ListGenres => require_session(session).and_then(|session| {
            for genre in session.list_genres().map_err(|e| e.to_string())? {
                println!("{:>4}  {}", genre.id, genre.title);
            }
            Ok(())
        }),

        InnerCommand::AddGenre { title } => require_session(session).and_then(|session| {
            let id = session.add_genre(&title).map_err(|e| e.to_string())?;
            println!("Added genre {}.", id);
            Ok(())
        }),

        InnerCommand::AddBook {
            title,
            author,
            year,
            genre,
            image,
        } => require_session(session).and_then(|session| {
            let picked = image.as_deref().map(read_picked_image).transpose()?;
            let id = session
                .add_book(make_fields(title, author, year, genre), picked)
                .map_err(|e| e.to_string())?;
            println!("Added book {}.", id);
            Ok(())
        }),

        InnerCommand::UpdateBook {
            id,
            title,
            author,
            year,
            genre,
            image,
        } => require_session(session).and_then(|session| {
            let picked = image.as_deref().map(read_picked_image).transpose()?;
            session
                .update_book(id, make_fields(title, author, year, genre), picked)
                .map_err(|e| e.to_string())?;
            println!("Updated book {}.", id);
            Ok(())
        }),

        InnerCommand::DeleteBook { id } => require_session(session).and_then(|session| {
            session.delete_book(id).map_err(|e| e.to_string())?;
            println!("Deleted book {}.", id);
            Ok(())
        }),

        InnerCommand::Show { id } => require_session(session).and_then(|session| {
            match session.book_details(id).map_err(|e| e.to_string())? {
                Some(details) => {
                    println!("Title:  {}", details.book.title);
                    println!("Author: {}", details.book.author);
                    println!(
                        "Year:   {}",
                        details.book.year.map_or("-".to_string(), |y| y.to_string())
                    );
                    println!("Genre:  {}", details.genre_title.as_deref().unwrap_or("-"));
                    println!("Image:  {}", details.image.display());
                    Ok(())
                }
                None => Err(format!("Book {} not found.", id)),
            }
        }),

        InnerCommand::AttachImage { id, path } => require_session(session).and_then(|session| {
            let details = session
                .book_details(id)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("Book {} not found.", id))?;
            let picked = read_picked_image(&path)?;
            session
                .update_book(id, details.book.fields(), Some(picked))
                .map_err(|e| e.to_string())?;
            println!("Attached image to book {}.", id);
            Ok(())
        }),

        InnerCommand::Exit => return CommandExecutionResult::Exit,
    };

    match outcome {
        Ok(()) => CommandExecutionResult::Ok,
        Err(msg) => CommandExecutionResult::Error(msg),
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    // Default assets dir to the parent of the database file
    let assets_dir = match cli_args.assets_dir {
        Some(path) => path,
        None => cli_args
            .db_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    if let Some(parent) = cli_args.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }

    let users = SqliteUserStore::new(&cli_args.db_path)?;
    let catalog = SqliteCatalogStore::new(&cli_args.db_path)?;
    let assets = AssetStore::new(&assets_dir);
    assets.init().context("Failed to initialize asset store")?;

    let service = CatalogService::new(Arc::new(users), Arc::new(catalog), assets);
    let mut session: Option<CatalogSession> = None;

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = reader.read_line(&mut line).context("Failed to read line")?;
        if read == 0 {
            break;
        }

        match execute_command(line.trim(), &service, &mut session) {
            CommandExecutionResult::Ok => {}
            CommandExecutionResult::Exit => break,
            CommandExecutionResult::Error(err) => {
                eprintln!("Something went wrong: {}", err);
                continue;
            }
        }
    }
    Ok(())
}
