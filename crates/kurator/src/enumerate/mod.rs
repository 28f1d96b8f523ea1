pub mod item;
pub mod scanner;

pub use item::ObjectWorkItem;
pub use scanner::ArchiveScanner;
