pub mod branch;
pub mod catalog;
pub mod damage;
pub mod fluid;
pub mod thermal;
pub mod units;

pub(crate) mod geometry;
pub(crate) mod outlet;
pub(crate) mod pipe;
