pub mod entity;
pub mod layer;
pub mod light_sprite;
