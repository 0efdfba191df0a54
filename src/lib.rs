extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod dirichlet;
pub mod fe;
pub mod mesh;
pub mod partition;
pub mod space;
pub mod sparse;

pub type Dim = usize;
