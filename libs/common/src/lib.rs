pub mod day;
pub mod token;

pub use day::local_day;
pub use token::session_token;
