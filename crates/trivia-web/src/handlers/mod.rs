pub mod health;
pub mod trivia;
