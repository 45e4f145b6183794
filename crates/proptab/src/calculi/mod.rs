pub mod tableau;

pub use tableau::StepTableau;
