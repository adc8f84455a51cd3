pub mod umya;

pub use umya::UmyaTemplate;
