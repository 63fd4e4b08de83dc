pub mod damage;
pub mod loader;
