pub mod get;
pub mod get_url;
pub mod list;
pub mod publish;
