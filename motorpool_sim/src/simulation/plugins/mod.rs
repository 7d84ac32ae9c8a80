// motorpool_sim/src/simulation/plugins/mod.rs

pub mod entities;
pub mod placement;
pub mod spawner;
