use bookshelf_model::Book;
use bookshelf_model::view::DEFAULT_TOP_RATED;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

fn non_empty(s: &str) -> Result<String, String> {
    if s.trim().is_empty() { Err("cannot be empty".to_string()) } else { Ok(s.to_string()) }
}

fn rating(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Ok(_) => Err("must be a non-negative number".to_string()),
        Err(error) => Err(error.to_string()),
    }
}

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version)]
#[command(about = "Keep track of your books, online or not")]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Act as if there is no connection: new books are stored locally and
    /// pushed later with `sync`
    #[arg(long, global = true)]
    pub offline: bool,

    /// Log more (repeat for even more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List books
    List {
        /// Use the listing that spans every page of the server's storage
        #[arg(long)]
        all: bool,
    },
    /// Show a single book
    Get { id: i64 },
    /// Add a book
    Add(NewBook),
    /// Change some fields of a book
    Update {
        id: i64,
        #[command(flatten)]
        fields: BookFields,
    },
    /// Delete a book
    Delete { id: i64 },
    /// List books currently being read
    Reading,
    /// List the best rated books
    Top {
        #[arg(short, default_value_t = DEFAULT_TOP_RATED)]
        n: usize,
    },
    /// Push books added while offline
    Sync,
    /// Apply a change notification (a book as JSON) pushed by the server
    Notify { payload: String },
}

#[derive(Debug, Args)]
pub struct NewBook {
    #[arg(long, value_parser = non_empty)]
    pub title: String,
    #[arg(long, value_parser = non_empty)]
    pub author: String,
    #[arg(long, value_parser = non_empty)]
    pub genre: String,
    #[arg(long, value_parser = non_empty)]
    pub status: String,
    #[arg(long, default_value_t = 0)]
    pub reviews: u32,
    #[arg(long, default_value_t = 0.0, value_parser = rating)]
    pub rating: f64,
}
impl NewBook {
    /// The server ignores the id of a new book; offline, the caller replaces it.
    pub fn into_book(self, id: i64) -> Book {
        Book::new(id, self.title, self.author, self.genre, self.status).with_reviews(self.reviews, self.rating)
    }
}

#[derive(Debug, Default, Args)]
pub struct BookFields {
    #[arg(long, value_parser = non_empty)]
    pub title: Option<String>,
    #[arg(long, value_parser = non_empty)]
    pub author: Option<String>,
    #[arg(long, value_parser = non_empty)]
    pub genre: Option<String>,
    #[arg(long, value_parser = non_empty)]
    pub status: Option<String>,
    #[arg(long)]
    pub reviews: Option<u32>,
    #[arg(long, value_parser = rating)]
    pub rating: Option<f64>,
}
impl BookFields {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.status.is_none()
            && self.reviews.is_none()
            && self.rating.is_none()
    }

    pub fn apply(self, mut book: Book) -> Book {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(genre) = self.genre {
            book.genre = genre;
        }
        if let Some(status) = self.status {
            book.status = status;
        }
        if let Some(reviews) = self.reviews {
            book.review_count = reviews;
        }
        if let Some(rating) = self.rating {
            book.avg_rating = rating;
        }
        book
    }
}
