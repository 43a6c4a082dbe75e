pub mod condition;
pub mod features;
pub mod sharpness;
