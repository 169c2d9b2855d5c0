pub mod models;
pub mod state;
pub mod traits;

pub use models::*;
pub use state::*;
pub use traits::*;
