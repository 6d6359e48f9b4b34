use std::path::Path;

use colored::Colorize;

use crate::book::{create_book, memory_book, open_book, Book};
use crate::error::Result;

/// Opens the output book, creating it when needed. A dry run always gets an
/// in-memory book so nothing is written to disk.
pub fn get_book(path: &Path, dry_run: bool, overwrite: bool, currency: &str) -> Result<Book> {
    if path.exists() && !overwrite {
        println!(
            "{}",
            "Existing book found; data will be added to it. To create a new book, use a different name or --overwrite."
                .yellow()
        );
        if dry_run {
            println!("Dry run: an empty in-memory book is used instead.");
            return memory_book(currency);
        }
        return open_book(path);
    }

    if dry_run {
        println!("Dry run: creating an in-memory book; {} will not be written.", path.display());
        return memory_book(currency);
    }
    println!("Creating book {}", path.display());
    create_book(path, currency, overwrite)
}

pub fn finish(book: Book) -> Result<()> {
    if book.is_in_memory() {
        println!("Dry run finished; nothing was written.");
    } else if let Some(path) = book.path() {
        println!("Book saved to {}", path.display());
    }
    book.close()
}
