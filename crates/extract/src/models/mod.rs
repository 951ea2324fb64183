mod asset;
mod book;
mod character;
mod page;

pub use self::asset::{PageAsset, SoundClip};
pub use self::book::{Book, Cover};
pub use self::character::Character;
pub use self::page::{Page, word_count};
