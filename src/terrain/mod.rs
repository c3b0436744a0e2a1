// 地形生成模块

pub mod color_map;
pub mod density;
pub mod gradient;
pub mod height_field;
pub mod noise;
pub mod permutation;

pub use color_map::*;
pub use density::*;
pub use gradient::*;
pub use height_field::*;
pub use noise::*;
pub use permutation::*;
