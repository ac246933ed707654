use crate::args::{Cli, Command};
use crate::error::{ErrorKind, Result};
use bookshelf_cache::{Location, Repository};
use bookshelf_config::Config;
use bookshelf_model::{Book, view};
use bookshelf_remote::RetryPolicy;
use bookshelf_remote::gateway::HttpGateway;
use bookshelf_sync::{Connectivity, Shelf, Source, Sourced};
use exn::ResultExt;
use std::sync::Arc;

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .or_raise(|| ErrorKind::Config)?;
    tracing::debug!(?config, "loaded configuration");

    let retry = RetryPolicy::new(config.remote.max_attempts, config.remote.backoff());
    let gateway = HttpGateway::new(&config.remote.base_url, config.remote.timeout(), retry)
        .or_raise(|| ErrorKind::Remote)?;
    let cache = Repository::lazy(Location::from(config.cache.path.clone()));
    let shelf = Shelf::new(Arc::new(gateway), cache.clone());
    let connectivity = Connectivity::from(!cli.offline);

    let outcome = execute(&shelf, cli.command, connectivity).await;
    // Let background mirrors from the last read land before the process exits.
    shelf.flush().await;
    cache.close().await;
    outcome
}

async fn execute(shelf: &Shelf, command: Command, connectivity: Connectivity) -> Result<()> {
    match command {
        Command::List { all } => {
            let books = if all { shelf.get_all_paged().await } else { shelf.get_all().await };
            print_books(&books.or_raise(|| ErrorKind::Command)?);
        },
        Command::Get { id } => {
            let book = shelf.get(id).await.or_raise(|| ErrorKind::Command)?;
            print_books(&book.map(|book| vec![book]));
        },
        Command::Add(new) => {
            let id = match connectivity {
                // The server assigns the real id.
                Connectivity::Online => 0,
                Connectivity::Offline => shelf.cache().next_local_id().await.or_raise(|| ErrorKind::Cache)?,
            };
            let created = shelf.create(&new.into_book(id), connectivity).await.or_raise(|| ErrorKind::Command)?;
            if created.is_local() {
                println!("Stored offline; run `bookshelf sync` once connected.");
            }
            print_books(&created.map(|book| vec![book]));
        },
        Command::Update { id, fields } => {
            if fields.is_empty() {
                println!("Nothing to update.");
                return Ok(());
            }
            let current = shelf.get(id).await.or_raise(|| ErrorKind::Command)?.into_inner();
            let updated = shelf.update(&fields.apply(current)).await.or_raise(|| ErrorKind::Command)?;
            print_books(&Sourced::network(vec![updated]));
        },
        Command::Delete { id } => {
            shelf.delete(id).await.or_raise(|| ErrorKind::Command)?;
            println!("Deleted book {id}.");
        },
        Command::Reading => {
            let books = shelf.get_all().await.or_raise(|| ErrorKind::Command)?;
            print_books(&books.map(|books| view::reading(&books)));
        },
        Command::Top { n } => {
            let books = shelf.get_all_paged().await.or_raise(|| ErrorKind::Command)?;
            print_books(&books.map(|books| view::top_rated(&books, n)));
        },
        Command::Sync => {
            let report = shelf.sync_pending().await.or_raise(|| ErrorKind::Command)?;
            for pushed in &report.pushed {
                println!("{} -> {}  {}", pushed.local_id, pushed.book.id, pushed.book);
            }
            println!("Pushed {} book(s), {} still waiting.", report.pushed.len(), report.remaining);
        },
        Command::Notify { payload } => {
            let book = shelf.apply_notification(&payload).await.or_raise(|| ErrorKind::Command)?;
            println!("Applied: {book}");
        },
    }
    Ok(())
}

fn print_books(books: &Sourced<Vec<Book>>) {
    println!("[{}]", books.source);
    if books.data.is_empty() {
        println!("No books found.");
    }
    for book in &books.data {
        println!("{}", line(book));
    }
    if books.source == Source::Local {
        println!("(offline: showing cached books)");
    }
}

fn line(book: &Book) -> String {
    format!(
        "{:>6}  {}  [{}, {}]  {:.1} ({} reviews)",
        book.id, book, book.genre, book.status, book.avg_rating, book.review_count
    )
}
