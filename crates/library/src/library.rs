//! The book shelf and the current selection.

use crate::context::Context;
use crate::error::Result;
use crate::ingest::ingest;
use std::sync::Arc;
use storybook_extract::Document;
use storybook_extract::models::{Book, Cover};

struct Sample {
    title: &'static str,
    cover: &'static str,
    pages: &'static [&'static str],
}

const SAMPLES: &[Sample] = &[
    Sample {
        title: "The Great Gatsby",
        cover: "https://upload.wikimedia.org/wikipedia/commons/7/7a/The_Great_Gatsby_Cover_1925_Retouched.jpg",
        pages: &[
            "In my younger and more vulnerable years my father gave me some advice that I've been turning over in my \
             mind ever since.",
            "'Whenever you feel like criticizing any one,' he told me, 'just remember that all the people in this \
             world haven't had the advantages that you've had.'",
            "He didn't say any more, but we've always been unusually communicative in a reserved way, and I \
             understood that he meant a great deal more than that.",
        ],
    },
    Sample {
        title: "Moby Dick",
        cover: "https://upload.wikimedia.org/wikipedia/commons/3/36/Moby-Dick_FE_title_page.jpg",
        pages: &[
            "Call me Ishmael. Some years ago\u{2014}never mind how long precisely\u{2014}having little or no money in \
             my purse, and nothing particular to interest me on shore, I thought I would sail about a little and see \
             the watery part of the world.",
            "It is a way I have of driving off the spleen and regulating the circulation. Whenever I find myself \
             growing grim about the mouth; whenever it is a damp, drizzly November in my soul; whenever I find \
             myself involuntarily pausing before coffin warehouses, and bringing up the rear of every funeral I \
             meet\u{2014}then, I account it high time to get to sea as soon as I can.",
        ],
    },
];

/// Books available to read, in the order they were added, and the one being
/// read (if any).
///
/// Titles are not unique; adding the same document twice shelves two books.
#[derive(Debug, Clone, Default)]
pub struct Library {
    books: Vec<Arc<Book>>,
    selected: Option<usize>,
}
impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// A library holding the built-in sample books, nothing selected.
    pub fn with_samples() -> Self {
        let books = SAMPLES
            .iter()
            .map(|sample| Arc::new(Book::from_texts(sample.title, Cover::url(sample.cover), sample.pages)))
            .collect();
        Self { books, selected: None }
    }

    pub fn books(&self) -> &[Arc<Book>] {
        &self.books
    }

    pub fn selected(&self) -> Option<&Arc<Book>> {
        self.selected.and_then(|index| self.books.get(index))
    }

    /// Shelves a book and selects it.
    pub fn add(&mut self, book: Book) -> Arc<Book> {
        let book = Arc::new(book);
        self.books.push(book.clone());
        self.selected = Some(self.books.len() - 1);
        book
    }

    /// Selects the first book with this title.
    pub fn select(&mut self, title: &str) -> Option<Arc<Book>> {
        let index = self.books.iter().position(|book| book.title == title)?;
        self.select_at(index)
    }

    pub fn select_at(&mut self, index: usize) -> Option<Arc<Book>> {
        let book = self.books.get(index)?.clone();
        self.selected = Some(index);
        Some(book)
    }

    /// Returns to the shelf.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Ingests a document, then shelves and selects the new book. On failure
    /// the library is left as it was.
    pub async fn ingest(&mut self, ctx: &Context, document: Document) -> Result<Arc<Book>> {
        let book = ingest(ctx, document).await?;
        Ok(self.add(book))
    }
}
