pub mod db;
pub mod post_llm;
pub mod style_llm;

pub use db::DbAdapter;
pub use post_llm::OpenAiPostAdapter;
pub use style_llm::OpenAiStyleAdapter;
