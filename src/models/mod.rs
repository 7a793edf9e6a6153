pub mod history;
pub mod line;
pub mod page;
pub mod utterance;

pub use history::*;
pub use line::*;
pub use page::*;
pub use utterance::*;
