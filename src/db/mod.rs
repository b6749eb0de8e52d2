mod repository;
mod schema;
mod store;

pub use repository::Repository;
#[cfg(test)]
pub use store::Store;
