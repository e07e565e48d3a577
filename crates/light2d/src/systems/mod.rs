pub mod light_emitters;
pub mod lighting;
