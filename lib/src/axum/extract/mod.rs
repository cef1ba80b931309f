pub mod operator;

pub use operator::Operator;
