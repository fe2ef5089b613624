mod assets;
mod core;
mod engine;
mod fs;
mod mesh;
mod texture;
mod timer;
mod vertex;

pub use assets::*;
pub use self::core::*;
pub use engine::*;
pub use fs::*;
pub use mesh::*;
pub use texture::*;
pub use timer::*;
pub use vertex::*;
