mod entry;

pub use entry::UrlEntry;
