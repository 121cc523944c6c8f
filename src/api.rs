pub mod get_answer;
pub mod index;
pub mod version;
