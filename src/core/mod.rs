// Shared domain models
pub mod models {
    pub use crate::models::*;
}
