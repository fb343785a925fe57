pub mod dedup;
pub mod load;
pub mod source;
pub mod stage;
pub mod steam;
pub mod tmdb;
