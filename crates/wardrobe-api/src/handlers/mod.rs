//! Request handlers.

pub mod health;
pub mod outfit;
pub mod sessions;
pub mod wardrobe;

pub use health::*;
pub use outfit::*;
pub use sessions::*;
pub use wardrobe::*;
