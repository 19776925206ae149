mod extract;
mod server;

pub use extract::JsonBody;
pub use server::*;
