mod query;
mod urls;

pub use query::*;
pub use urls::*;
