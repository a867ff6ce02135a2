pub mod middleware;
pub mod passwords;
pub mod sessions;
