pub mod fetcher;
pub mod page;
pub mod robots;
pub mod traits;

#[cfg(feature = "browser")]
pub mod chrome;

#[cfg(test)]
pub mod fake;

pub use fetcher::HttpDriver;
pub use robots::{PermissionCheck, RobotsPolicy};
pub use traits::{Element, PageDriver};

#[cfg(feature = "browser")]
pub use chrome::ChromeDriver;
