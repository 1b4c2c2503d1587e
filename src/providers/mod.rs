pub mod awesome_api;
pub mod ibge;
pub mod util;

pub use awesome_api::AwesomeApiProvider;
pub use ibge::IbgeProvider;
